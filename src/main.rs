use tokio::runtime::Builder;

use legalqa_annotator::web::server::start_app;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("legalqa-annotator")
        .thread_stack_size(3 * 1024 * 1024)
        .enable_io()
        .enable_time()
        .build()?;

    runtime.block_on(start_app())
}
