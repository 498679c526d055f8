use super::GpuDevice;
use crossbeam::channel::{self, Receiver, Sender};
use log::*;

/// Data available to render commands while they execute.
pub struct RenderContext<'a> {
    pub device: &'a dyn GpuDevice,
}

/// A unit of work executed on the render thread.
///
/// Commands are moved into the queue, so everything they touch has to be owned by them (usually
/// through an [`std::sync::Arc`]). This way a command can never outlive the data it refers to.
pub trait RenderCommand: Send + 'static {
    fn label(&self) -> &'static str;
    fn execute(self: Box<Self>, ctx: &RenderContext);
}

/// Multi-producer FIFO queue of [`RenderCommand`]s. Clones share the same queue.
#[derive(Clone)]
pub struct RenderCommandQueue {
    sender: Sender<Box<dyn RenderCommand>>,
    receiver: Receiver<Box<dyn RenderCommand>>,
}

impl Default for RenderCommandQueue {
    fn default() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }
}

impl RenderCommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, command: impl RenderCommand) {
        // The queue owns a receiver itself, so the channel can't be disconnected
        let _ = self.sender.send(Box::new(command));
    }

    /// Amount of commands waiting for execution.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Executes commands that were queued before this call, in order. Commands queued during
    /// execution are left for the next call. Returns the amount of executed commands.
    pub fn execute_pending(&self, ctx: &RenderContext) -> usize {
        let queued = self.receiver.len();
        let mut executed = 0;
        for command in self.receiver.try_iter().take(queued) {
            trace!("Executing render command `{}`", command.label());
            command.execute(ctx);
            executed += 1;
        }
        executed
    }

    /// Drops all pending commands without executing them.
    pub fn discard_pending(&self) -> usize {
        self.receiver.try_iter().count()
    }
}
