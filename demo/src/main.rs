use std::time::{Duration, Instant};

use obs_bootstrap::re_exports::opentelemetry::global;
use obs_bootstrap::re_exports::opentelemetry::metrics::Counter;
use obs_bootstrap::re_exports::opentelemetry::KeyValue;
use obs_bootstrap::{CallContext, OtelOptions, ProcessingStrategy, Protocol, StartError};

/// Run with `DEMO_ENVIRONMENT=local` (the default) to export every span as it
/// ends, or any other value to batch. Pass a collector URL as the first
/// argument to export somewhere other than the default endpoint.
fn main() -> anyhow::Result<()> {
    let endpoint = std::env::args().nth(1);
    let environment = std::env::var("DEMO_ENVIRONMENT").unwrap_or_else(|_| "local".to_owned());

    let strategy = ProcessingStrategy::for_environment(Some(&environment));
    println!(
        "demo: environment={environment}, spans and logs are exported {}",
        match strategy {
            ProcessingStrategy::Synchronous => "as each one ends",
            ProcessingStrategy::Batched => "in background batches",
        }
    );

    let mut builder = OtelOptions::builder()
        .protocol(Protocol::HttpProtobuf)
        .resource_attributes([
            ("deployment.environment.name", environment.as_str()),
            ("service.version", "1.0.0"),
        ]);
    if let Some(ref url) = endpoint {
        builder = builder.endpoint(url);
    }

    let ctx = CallContext::background().with_timeout(Duration::from_secs(5));
    let mut shutdown = match obs_bootstrap::start(&ctx, "obs-bootstrap-demo", Some(builder.build()))
    {
        Ok(shutdown) => shutdown,
        Err(failure) => match failure.into_parts() {
            (StartError::Resource(err), shutdown) => {
                for detector in err.failures() {
                    let cause = std::error::Error::source(detector)
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    eprintln!("demo: {detector}: {cause}");
                }
                shutdown
            }
            (err, _) => return Err(err.into()),
        },
    };

    let orders = global::meter("obs-bootstrap-demo")
        .u64_counter("demo.orders")
        .build();

    // Synchronous export pays for each span here; batching defers it.
    let started = Instant::now();
    for order_id in 1..=3 {
        place_order(order_id, &orders);
    }
    println!("demo: placed 3 orders in {:?}", started.elapsed());

    let ctx = CallContext::background().with_timeout(Duration::from_secs(10));
    match shutdown.shutdown(&ctx) {
        Ok(()) => println!("demo: every provider flushed and shut down"),
        Err(err) => {
            for failure in err.failures() {
                eprintln!(
                    "demo: {} provider did not shut down cleanly: {}",
                    failure.signal(),
                    failure.error()
                );
            }
        }
    }

    Ok(())
}

#[tracing::instrument(skip(orders))]
fn place_order(order_id: u32, orders: &Counter<u64>) {
    tracing::info!("placing order");
    reserve_stock(order_id);

    let outcome = if order_id == 2 {
        tracing::warn!("payment declined once, retrying");
        "retried"
    } else {
        "ok"
    };
    orders.add(1, &[KeyValue::new("outcome", outcome)]);
}

#[tracing::instrument]
fn reserve_stock(order_id: u32) {
    std::thread::sleep(Duration::from_millis(20));
    tracing::debug!("stock reserved");
}
