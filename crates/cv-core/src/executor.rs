//! Single-threaded executor owning the CAD kernel
//!
//! The kernel keeps global state that is not safe for concurrent use. It is
//! therefore moved onto one dedicated thread, and the only way to reach it is
//! to submit a job through a `KernelHandle`. Jobs run one at a time, in
//! submission order, each receiving the `KernelSession`.

use std::sync::mpsc;
use std::thread::JoinHandle;

use cv_cad::CadKernel;

use crate::error::IoError;

/// Errors of the kernel executor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Failed to start kernel thread: {0}")]
    Spawn(String),

    #[error("Kernel executor has stopped")]
    Stopped,
}

impl From<ExecutorError> for IoError {
    fn from(_: ExecutorError) -> Self {
        IoError::ExecutorStopped
    }
}

/// Exclusive access to the kernel, only available inside a job
pub struct KernelSession {
    kernel: Box<dyn CadKernel>,
}

impl KernelSession {
    pub fn kernel(&mut self) -> &mut dyn CadKernel {
        self.kernel.as_mut()
    }

    pub fn kernel_name(&self) -> &str {
        self.kernel.name()
    }
}

type Job = Box<dyn FnOnce(&mut KernelSession) + Send>;

enum Message {
    Job(Job),
    Stop,
}

/// Cloneable, thread-safe handle used to submit kernel jobs
#[derive(Clone)]
pub struct KernelHandle {
    sender: mpsc::Sender<Message>,
}

impl KernelHandle {
    /// Run `job` on the kernel thread and wait for its result
    pub fn run<R, F>(&self, job: F) -> Result<R, ExecutorError>
    where
        R: Send + 'static,
        F: FnOnce(&mut KernelSession) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move |session| {
            // The caller may have given up waiting
            let _ = reply_tx.send(job(session));
        });

        self.sender
            .send(Message::Job(job))
            .map_err(|_| ExecutorError::Stopped)?;
        reply_rx.recv().map_err(|_| ExecutorError::Stopped)
    }
}

/// Owner of the kernel thread
///
/// Dropping the executor stops the thread once the jobs already queued have
/// run. Handles outliving it get `ExecutorError::Stopped`.
pub struct KernelExecutor {
    handle: KernelHandle,
    kernel_name: String,
    thread: Option<JoinHandle<()>>,
}

impl KernelExecutor {
    /// Move `kernel` onto a new thread
    pub fn spawn(kernel: Box<dyn CadKernel>) -> Result<Self, ExecutorError> {
        let (sender, receiver) = mpsc::channel::<Message>();
        let kernel_name = kernel.name().to_string();

        let thread = std::thread::Builder::new()
            .name("cad-kernel".to_string())
            .spawn(move || {
                let mut session = KernelSession { kernel };
                tracing::debug!("Kernel thread started ({})", session.kernel_name());
                while let Ok(Message::Job(job)) = receiver.recv() {
                    job(&mut session);
                }
                tracing::debug!("Kernel thread stopped");
            })
            .map_err(|e| ExecutorError::Spawn(e.to_string()))?;

        Ok(Self {
            handle: KernelHandle { sender },
            kernel_name,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> KernelHandle {
        self.handle.clone()
    }

    /// Name of the kernel owned by this executor
    pub fn kernel_name(&self) -> &str {
        &self.kernel_name
    }
}

impl Drop for KernelExecutor {
    fn drop(&mut self) {
        let _ = self.handle.sender.send(Message::Stop);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("Kernel thread panicked");
        }
    }
}
