//! Block hand-off from the planner to the engine.
//!
//! The planner side owns a [`BlockProducer`], the engine a [`BlockSource`].
//! A `heapless::spsc::Queue` split into its two halves provides both; each
//! block moves by value, so the planner cannot touch it after enqueue.

use heapless::spsc::{Consumer, Producer};

use crate::error::{Error, QueueError, Result};
use crate::motion::{Block, BlockId};

/// Consumer side of the block queue, polled by the engine.
pub trait BlockSource<const N: usize> {
    /// Take the oldest block, if any.
    fn dequeue(&mut self) -> Option<Block<N>>;
}

impl<'q, const N: usize, const Q: usize> BlockSource<N> for Consumer<'q, Block<N>, Q> {
    #[inline]
    fn dequeue(&mut self) -> Option<Block<N>> {
        Consumer::dequeue(self)
    }
}

/// Planner side of the block queue.
///
/// Assigns each block a non-zero id, used with
/// [`EngineShared::is_block_busy`](super::EngineShared::is_block_busy).
pub struct BlockProducer<'q, const N: usize, const Q: usize> {
    producer: Producer<'q, Block<N>, Q>,
    last_id: BlockId,
}

impl<'q, const N: usize, const Q: usize> BlockProducer<'q, N, Q> {
    /// Wrap the producer half of a split queue.
    pub fn new(producer: Producer<'q, Block<N>, Q>) -> Self {
        Self {
            producer,
            last_id: BlockId::NONE,
        }
    }

    /// Hand a block to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] when no slot is free; the block is dropped.
    pub fn enqueue(&mut self, mut block: Block<N>) -> Result<BlockId> {
        if !self.producer.ready() {
            return Err(Error::Queue(QueueError::Full));
        }
        let id = self.last_id.next();
        block.id = id;
        self.producer
            .enqueue(block)
            .map_err(|_| Error::Queue(QueueError::Full))?;
        self.last_id = id;
        Ok(id)
    }

    /// Queue a position reset that emits no pulses.
    pub fn sync(&mut self, position: [i32; N]) -> Result<BlockId> {
        self.enqueue(Block::sync(position))
    }

    /// Whether a slot is free.
    #[inline]
    pub fn ready(&self) -> bool {
        self.producer.ready()
    }

    /// Id of the most recently queued block.
    #[inline]
    pub fn last_id(&self) -> BlockId {
        self.last_id
    }
}
