/// Progress reporting hook for long-running remote calls.
///
/// Remote calls are blocking and cannot be interrupted once started, so
/// `is_canceled` is only a stable integration point for hosts.
pub trait ProgressMonitor {
    fn begin_task(&mut self, name: &str);

    fn done(&mut self);

    fn is_canceled(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn begin_task(&mut self, _name: &str) {}

    fn done(&mut self) {}
}
