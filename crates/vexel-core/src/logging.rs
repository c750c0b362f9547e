/// Install the default tracing subscriber for vexel tools and examples.
///
/// Applications embedding vexel as a library should install their own
/// subscriber instead.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("info,wgpu_core=warn,wgpu_hal=warn,naga=warn")
        .init();
}
