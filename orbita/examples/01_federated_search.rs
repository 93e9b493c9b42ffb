mod common;
use common::{area_of_interest, get_connector, last_years};
use orbita::{Months, Orbita, OrbitaError, SearchQuery};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,orbita=debug (build with --features tracing)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    // 1. Setup Orbita with the deterministic mock provider.
    let orbita = Orbita::builder()
        .with_connector(get_connector())
        .page_size(10)
        .build()?;

    // 2. Summer scenes of the last two years.
    let query = SearchQuery::new(area_of_interest(), last_years(2)?)
        .months(Months::JUNE | Months::JULY | Months::AUGUST);
    let mut session = orbita.search(query, CancellationToken::new())?;

    // 3. Page through the federated stream, most recent first.
    println!("{:<40} | {:<20} | Cloud %", "Id", "Sensed");
    println!("{:-<41}|{:-<22}|{:-<9}", "", "", "");
    let mut pages = 0;
    while session.has_more() && pages < 3 {
        let report = session.next_n_results(8).await;
        for w in report.warnings.iter().cloned().flat_map(OrbitaError::flatten) {
            eprintln!("warning: {w}");
        }
        let Some(batch) = report.response else { break };
        for r in batch.results {
            println!(
                "{:<40} | {:<20} | {}",
                r.id,
                r.sensing_time.format("%Y-%m-%d %H:%M"),
                r.metadata["cloudCover"]
            );
        }
        pages += 1;
    }

    Ok(())
}
