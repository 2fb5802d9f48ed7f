use std::time::{Duration, Instant};

use evstats::generator::Generator;
use evstats::{GeneratorConfig, Store};

use fixture::init_fixture;

fn report(label: &str, elapsed: Duration, iterations: u32, rows: usize) {
    let avg_time = elapsed / iterations;
    println!("{label}");
    println!("Total time: {:?}", elapsed);
    println!("Average: {:?} per iteration", avg_time);
    println!(
        "Throughput: {:.2} thousand rows/sec\n",
        (rows as f64 / avg_time.as_secs_f64()) / 1_000.0
    );
}

fn main() {
    println!("=== Benchmark: EV Series Generation and Views ===\n");

    let config = GeneratorConfig::default();
    let generator = Generator::new(&config).expect("default config is valid");

    println!("--- Generator run ---");
    let iterations = 1_000;
    let start = Instant::now();
    let mut rows = 0;
    for _ in 0..iterations {
        rows = generator.run().sales.len();
    }
    report("generate", start.elapsed(), iterations, rows);

    // the views load Parquet on each call, so run fewer iterations
    let store = Store::open(init_fixture()).expect("Failed to open benchmark store");
    let view_iterations = 50;

    println!("--- Store views ---");
    let start = Instant::now();
    let mut checksum = 0;
    for _ in 0..view_iterations {
        checksum += store.sales_by_year().expect("sales_by_year failed").height();
        checksum += store.top_countries(store.last_year(), 10).expect("top_countries failed").height();
        checksum += store
            .country_growth(store.first_year(), store.last_year())
            .expect("country_growth failed")
            .height();
    }
    report("views", start.elapsed(), view_iterations, checksum / view_iterations as usize);
    println!("(checksum: {checksum})");
}
