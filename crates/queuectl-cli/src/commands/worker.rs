/// `worker stop` has no control channel in this single-process foreground
/// model; stopping means interrupting the
/// `worker start` session that is supervising them.
pub fn stop() {
    println!("queuectl runs workers in the foreground under `worker start`.");
    println!("Press Ctrl+C in that session to stop them gracefully.");
}
