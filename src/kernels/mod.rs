//! Pure, stateless kernels over id buffers.
//!
//! These run after a buffer has been filled and never touch the engine.

pub mod id_offset;
