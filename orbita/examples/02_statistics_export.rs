mod common;
use common::{area_of_interest, get_connector, last_years};
use orbita::{ImageryConnector, Orbita, OutputSelector, StatisticsQuery};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let connector = get_connector();
    let key = connector.key();
    let orbita = Orbita::builder()
        .with_connector(connector)
        .max_auxiliary_value(30)
        .distribution(true)
        .build()?;

    // 1. Fetch two years of NDVI with the cloud mask, one year per request.
    let query = StatisticsQuery::new(
        key,
        area_of_interest(),
        OutputSelector {
            layer: "NDVI".into(),
            auxiliary: true,
        },
    )
    .range(last_years(2)?);
    let mut series = orbita.statistics(query)?;
    let report = series.run(&CancellationToken::new()).await;
    println!(
        "state: {:?}, chunks: {}, covered: {:?}",
        report.state, report.chunks_requested, report.covered
    );

    // 2. Chart-ready view: cloudy days dropped, value range rounded.
    for ch in series.derive().channels {
        println!(
            "{}: {} points, range {:?}",
            ch.id,
            ch.points.len(),
            ch.value_range
        );
    }

    // 3. CSV export of everything merged.
    let csv = series.accumulator().to_csv_table().to_csv_string()?;
    for line in csv.lines().take(5) {
        println!("{line}");
    }

    Ok(())
}
