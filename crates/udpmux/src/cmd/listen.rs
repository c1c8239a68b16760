use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use udpmux_router::Router;

use crate::cmd::ListenArgs;
use crate::exit::{router_error, CliError, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let router = Router::new().map_err(|err| router_error("router setup failed", err))?;

    let mut port = args.port;
    for channel in &args.channels {
        port = router
            .rx_attach(port, *channel)
            .map_err(|err| router_error("attach failed", err))?;
    }
    eprintln!("listening on udp port {port}");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut idle = true;
        for channel in &args.channels {
            while let Some(value) = router.read(*channel) {
                idle = false;
                print_value(&value, *channel, format);
                printed = printed.saturating_add(1);
                if let Some(count) = args.count {
                    if printed >= count {
                        router.join();
                        return Ok(SUCCESS);
                    }
                }
            }
        }
        if idle {
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    router.join();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
