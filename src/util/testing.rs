//! Shared helpers for unit and integration tests.

use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{Extension, Level, Region};

static TEST_SETUP: Once = Once::new();

/// Install a test logging subscriber once per process.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// A small slice of the Beijing hierarchy, in parent-before-child order.
pub fn sample_regions() -> Vec<Region> {
    vec![
        Region::new("110000000000", "北京市", Level::Province, "0", 0)
            .with_extension(Extension::HousePrice(65000.0)),
        Region::new("110100000000", "市辖区", Level::Prefecture, "110000000000", 0),
        Region::new("110101000000", "东城区", Level::County, "110100000000", 111)
            .with_extension(Extension::EmploymentRate("97.1%".into())),
        Region::new("110102000000", "西城区", Level::County, "110100000000", 111),
        Region::new("110101001000", "东华门街道", Level::Township, "110101000000", 111),
        Region::new(
            "110101001001",
            "多福巷社区居委会",
            Level::Village,
            "110101001000",
            111,
        ),
        Region::new("120000000000", "天津市", Level::Province, "0", 0),
    ]
}

/// [`sample_regions`] as CSV text with a header line.
pub fn sample_csv() -> String {
    let mut out = String::from("code,name,level,parent_code,type,avg_house_price,employment_rate\n");
    for region in sample_regions() {
        let (price, rate) = match &region.extension {
            Some(Extension::HousePrice(p)) => (p.to_string(), "N/A".to_string()),
            Some(Extension::EmploymentRate(r)) => ("0".to_string(), r.clone()),
            None => ("0".to_string(), "N/A".to_string()),
        };
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            region.code,
            region.name,
            region.level.as_u8(),
            region.parent_code,
            region.kind,
            price,
            rate
        ));
    }
    out
}
