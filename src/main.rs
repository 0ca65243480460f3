use warden::utils::errors::WardenError;

fn main() -> Result<(), WardenError> {
    tokio::runtime::Builder::new_multi_thread()
        // Cap the number of blocking threads - under a login storm the argon
        // hashing work can otherwise explode the thread count.
        .max_blocking_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            warden::lib_main().await
        })
}
