/// CommandExecutor trait - external one-shot command submission contract
///
/// Used by the output image only for its initial layout transition: record a
/// one-shot command stream, submit it, and block the calling thread until
/// the queue drains. Internal scheduling (pools, fences) belongs to the
/// executor implementation.

use crate::error::Result;

/// Opaque handle to a command stream being recorded
///
/// For the Vulkan backend this is the raw command-buffer handle; the mock
/// executor mints sequential identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandStream(pub u64);

/// One-shot command recording and blocking submission
pub trait CommandExecutor: Send + Sync {
    /// Begin recording a one-shot command stream
    fn begin_one_shot(&self) -> Result<CommandStream>;

    /// End recording and submit the stream to the queue
    ///
    /// Returns as soon as the work is queued; completion is observed via
    /// `wait_idle`.
    fn submit(&self, stream: CommandStream) -> Result<()>;

    /// Block the calling thread until all submitted work on the queue completes
    ///
    /// No cancellation or timeout semantics: this runs to completion or the
    /// process treats the failure as fatal.
    fn wait_idle(&self) -> Result<()>;
}
