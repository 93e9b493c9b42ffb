use std::time::Duration;

use chrono::TimeDelta;
use orbita::{
    ImageryConnector, IntervalLength, Orbita, OrbitaError, SeriesState, StatisticsQuery,
};
use tokio_util::sync::CancellationToken;

use crate::helpers::{MockConnector, NDVI, aoi, daily_response, day, output, range};

const YEAR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn daily(name: &'static str) -> std::sync::Arc<MockConnector> {
    MockConnector::builder()
        .name(name)
        .with_stats_fn(|req| Ok(daily_response(req)))
        .build()
}

#[tokio::test]
async fn walks_backwards_in_bounded_contiguous_chunks() {
    let p = daily("sh");
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .max_chunk_span(YEAR)
        .build()
        .unwrap();
    let window = range(day(2019, 1, 1), day(2022, 1, 1));
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, true)).range(window);
    let mut series = orbita.statistics(query).unwrap();

    let report = series.run(&CancellationToken::new()).await;
    assert_eq!(report.state, SeriesState::Satisfied);
    assert_eq!(report.covered, Some(window));

    let reqs = p.stats_requests();
    assert_eq!(report.chunks_requested, reqs.len());
    assert_eq!(reqs.len(), 4);
    assert_eq!(reqs[0].range.end(), window.end());
    assert_eq!(reqs.last().unwrap().range.start(), window.start());
    for r in &reqs {
        assert!(r.range.span() <= TimeDelta::days(365));
    }
    for w in reqs.windows(2) {
        assert_eq!(w[0].range.start(), w[1].range.end());
    }

    let acc = series.accumulator();
    assert_eq!(acc.channel_ids().collect::<Vec<_>>(), vec![NDVI]);
    assert!(acc.auxiliary_on(day(2020, 2, 29).date_naive()).is_some());
    assert_eq!(acc.primary_count(), 1);
    assert_eq!(acc.channel(NDVI).unwrap().len(), 365 + 366 + 365);
}

#[tokio::test]
async fn resolution_is_clamped_and_bins_follow_distribution() {
    let p = MockConnector::builder()
        .name("coarse")
        .limits(60.0, 300.0)
        .with_stats_fn(|req| Ok(daily_response(req)))
        .build();
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .distribution(true)
        .build()
        .unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2022, 1, 1), day(2022, 2, 1)))
        .resolution(10.0)
        .crs("EPSG:3857");
    let mut series = orbita.statistics(query).unwrap();
    let _ = series.run(&CancellationToken::new()).await;

    let reqs = p.stats_requests();
    assert_eq!(reqs.len(), 1);
    assert!((reqs[0].resolution - 60.0).abs() < f64::EPSILON);
    assert_eq!(reqs[0].bins, Some(orbita::DISTRIBUTION_BINS));
    assert_eq!(reqs[0].crs, "EPSG:3857");
}

#[tokio::test]
async fn load_more_history_continues_from_covered_start() {
    let p = daily("sh");
    let orbita = Orbita::builder().with_connector(p.clone()).build().unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2021, 6, 1), day(2022, 1, 1)));
    let mut series = orbita.statistics(query).unwrap();
    let token = CancellationToken::new();
    assert!(series.run(&token).await.state.is_satisfied());

    let report = series.extend(day(2021, 1, 1), &token).await;
    assert!(report.state.is_satisfied());
    assert_eq!(report.chunks_requested, 1);
    assert_eq!(report.covered, Some(range(day(2021, 1, 1), day(2022, 1, 1))));

    let reqs = p.stats_requests();
    assert_eq!(reqs[1].range, range(day(2021, 1, 1), day(2021, 6, 1)));
    assert_eq!(series.accumulator().channel(NDVI).unwrap().len(), 365);
}

#[tokio::test]
async fn default_window_ends_now() {
    let p = daily("sh");
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .interval(IntervalLength::M1)
        .build()
        .unwrap();
    let mut series = orbita
        .statistics(StatisticsQuery::new(p.key(), aoi(), output(NDVI, false)))
        .unwrap();
    let report = series.run(&CancellationToken::new()).await;
    assert!(report.state.is_satisfied());

    let reqs = p.stats_requests();
    assert_eq!(reqs.len(), 1);
    let span = reqs[0].range.span();
    assert!(span >= TimeDelta::days(28) && span <= TimeDelta::days(31));
    assert!(chrono::Utc::now() - reqs[0].range.end() < TimeDelta::minutes(5));
}

#[test]
fn statistics_validates_before_fetching() {
    let stats = daily("stats");
    let search_only = MockConnector::builder()
        .name("search")
        .records(vec![])
        .build();
    let orbita = Orbita::builder()
        .with_connector(stats.clone())
        .with_connector(search_only.clone())
        .build()
        .unwrap();
    let window = range(day(2022, 1, 1), day(2022, 2, 1));

    let unknown = StatisticsQuery::new(orbita::ProviderKey::new("nobody"), aoi(), output(NDVI, false))
        .range(window);
    assert!(matches!(orbita.statistics(unknown), Err(OrbitaError::NotFound { .. })));

    let unsupported = StatisticsQuery::new(search_only.key(), aoi(), output(NDVI, false)).range(window);
    assert!(matches!(
        orbita.statistics(unsupported),
        Err(OrbitaError::Unsupported { .. })
    ));

    let bad_resolution = StatisticsQuery::new(stats.key(), aoi(), output(NDVI, false))
        .range(window)
        .resolution(0.0);
    assert!(matches!(
        orbita.statistics(bad_resolution),
        Err(OrbitaError::InvalidArg(_))
    ));
    assert_eq!(stats.stats_calls(), 0);
}

#[test]
fn unusable_provider_limits_are_an_error() {
    let inverted = MockConnector::builder()
        .name("inverted")
        .with_stats_fn(|req| Ok(daily_response(req)))
        .limits(60.0, 20.0)
        .build();
    let nan = MockConnector::builder()
        .name("nan")
        .with_stats_fn(|req| Ok(daily_response(req)))
        .limits(f64::NAN, 20.0)
        .build();
    let orbita = Orbita::builder()
        .with_connector(inverted.clone())
        .with_connector(nan.clone())
        .build()
        .unwrap();
    let window = range(day(2022, 1, 1), day(2022, 2, 1));

    for key in [inverted.key(), nan.key()] {
        let query = StatisticsQuery::new(key, aoi(), output(NDVI, false))
            .range(window)
            .resolution(10.0);
        match orbita.statistics(query) {
            Err(OrbitaError::InvalidArg(msg)) => assert!(msg.contains(key.as_str())),
            other => panic!("unexpected: {other:?}"),
        }
    }
    assert_eq!(inverted.stats_calls() + nan.stats_calls(), 0);
}

#[tokio::test]
async fn derived_series_and_csv_follow_the_accumulator() {
    let p = daily("sh");
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .max_auxiliary_value(50)
        .build()
        .unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, true))
        .range(range(day(2022, 1, 1), day(2022, 1, 4)));
    let mut series = orbita.statistics(query).unwrap();
    let _ = series.run(&CancellationToken::new()).await;

    let derived = series.derive();
    assert_eq!(derived.channels.len(), 1);
    let ch = &derived.channels[0];
    assert_eq!(ch.points.len(), 3);
    assert_eq!(ch.value_range, Some((0.1, 0.5)));
    assert_eq!(ch.points[0].auxiliary, Some(20.0));

    let csv = series.accumulator().to_csv_table().to_csv_string().unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "NDVI/date,NDVI/min,NDVI/max,NDVI/mean,NDVI/stDev,CLM/date,CLM/min,CLM/max,CLM/mean,CLM/stDev"
    );
    assert!(lines.next().unwrap().starts_with("2022-01-01T00:00:00.000Z,0.1,0.5,"));
    assert_eq!(csv.lines().count(), 4);
}
