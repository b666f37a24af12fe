// ID Generator - Snowflake-like, time-ordered 64-bit IDs
// Ordering by id is ordering by creation within one node

use std::sync::{Mutex, PoisonError};

use crate::core::current_time_millis;
use crate::error::{AppError, AppResult};

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_MASK: u64 = 0x3FF_FFFF_FFFF;

/// 64-bit ID format: [timestamp:42][node_id:10][sequence:12]
/// This allows for 1024 nodes and 4096 IDs per millisecond per node
#[derive(Debug)]
pub struct SnowflakeIdGenerator {
    node_id: u16,
    state: Mutex<GeneratorState>,
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

impl SnowflakeIdGenerator {
    pub fn new(node_id: u16) -> AppResult<Self> {
        if node_id > MAX_NODE_ID {
            return Err(AppError::Configuration(format!(
                "node id {} must be less than 1024",
                node_id
            )));
        }

        Ok(Self {
            node_id,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    /// Strictly increasing across calls. When the clock stalls, goes
    /// backwards, or a millisecond's sequence runs out, the logical
    /// timestamp advances past the wall clock instead of sleeping.
    pub fn next_id(&self) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = current_time_millis().max(0) as u64;

        if now > state.last_timestamp {
            state.last_timestamp = now;
            state.sequence = 0;
        } else if state.sequence < MAX_SEQUENCE {
            state.sequence += 1;
        } else {
            state.last_timestamp += 1;
            state.sequence = 0;
        }

        let id = ((state.last_timestamp & TIMESTAMP_MASK) << (NODE_BITS + SEQUENCE_BITS))
            | ((self.node_id as u64) << SEQUENCE_BITS)
            | state.sequence;

        id as i64
    }
}
