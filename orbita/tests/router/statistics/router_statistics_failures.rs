use std::time::Duration;

use orbita::{
    GENERIC_STATISTICS_MESSAGE, ImageryConnector, Orbita, OrbitaError, ResponseStatus,
    SeriesState, StatisticsQuery, StatisticsResponse,
};
use tokio_util::sync::CancellationToken;

use crate::helpers::{MockConnector, NDVI, aoi, daily_response, day, output, range};

const QUARTER: Duration = Duration::from_secs(90 * 24 * 60 * 60);

#[tokio::test]
async fn failed_chunk_keeps_earlier_data_and_is_not_retried() {
    let p = MockConnector::builder()
        .name("sh")
        .with_stats_fn(|req| {
            if req.range.end() < day(2022, 1, 1) {
                Err(OrbitaError::remote_payload(
                    "sh",
                    Some(400),
                    r#"{"error":{"status":400,"message":"Geometry is too large"}}"#,
                ))
            } else {
                Ok(daily_response(req))
            }
        })
        .build();
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .max_chunk_span(QUARTER)
        .build()
        .unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2021, 1, 1), day(2022, 1, 1)));
    let mut series = orbita.statistics(query).unwrap();

    let report = series.run(&CancellationToken::new()).await;
    assert_eq!(
        report.state,
        SeriesState::Failed {
            message: "Geometry is too large".into()
        }
    );
    assert_eq!(p.stats_calls(), 2);
    assert_eq!(report.chunks_requested, 2);
    let covered = report.covered.unwrap();
    assert_eq!(covered.end(), day(2022, 1, 1));
    assert_eq!(series.accumulator().channel(NDVI).unwrap().len(), 90);

    // the failure is terminal; extending does not refetch
    let again = series.extend(day(2020, 1, 1), &CancellationToken::new()).await;
    assert!(matches!(again.state, SeriesState::Failed { .. }));
    assert_eq!(p.stats_calls(), 2);
}

#[tokio::test]
async fn unreadable_error_body_maps_to_generic_message() {
    let p = MockConnector::builder()
        .name("sh")
        .returns_stats_error(OrbitaError::remote_payload("sh", Some(500), "<html>oops"))
        .build();
    let orbita = Orbita::builder().with_connector(p.clone()).build().unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2022, 1, 1), day(2022, 2, 1)));
    let mut series = orbita.statistics(query).unwrap();
    let report = series.run(&CancellationToken::new()).await;
    assert_eq!(
        report.state,
        SeriesState::Failed {
            message: GENERIC_STATISTICS_MESSAGE.into()
        }
    );
}

#[tokio::test]
async fn non_ok_status_marks_series_unavailable() {
    let p = MockConnector::builder()
        .name("sh")
        .with_stats_fn(|_| {
            Ok(StatisticsResponse {
                status: ResponseStatus::Failed("no data".into()),
                channels: vec![],
            })
        })
        .build();
    let orbita = Orbita::builder().with_connector(p.clone()).build().unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2020, 1, 1), day(2022, 1, 1)));
    let mut series = orbita.statistics(query).unwrap();
    let report = series.run(&CancellationToken::new()).await;
    assert!(matches!(report.state, SeriesState::Unavailable { .. }));
    assert_eq!(p.stats_calls(), 1);
    assert!(series.accumulator().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_chunk_times_out_into_failure() {
    let p = MockConnector::builder()
        .name("sh")
        .delay(Duration::from_secs(60))
        .with_stats_fn(|req| Ok(daily_response(req)))
        .build();
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .provider_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2022, 1, 1), day(2022, 2, 1)));
    let mut series = orbita.statistics(query).unwrap();
    let report = series.run(&CancellationToken::new()).await;
    assert_eq!(
        report.state,
        SeriesState::Failed {
            message: "The statistics service did not answer in time.".into()
        }
    );
    assert!(series.accumulator().is_empty());
}

#[tokio::test]
async fn cancelled_before_start_requests_nothing() {
    let p = MockConnector::builder()
        .name("sh")
        .with_stats_fn(|req| Ok(daily_response(req)))
        .build();
    let orbita = Orbita::builder().with_connector(p.clone()).build().unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2022, 1, 1), day(2022, 2, 1)));
    let mut series = orbita.statistics(query).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let report = series.run(&token).await;
    assert_eq!(report.state, SeriesState::Cancelled);
    assert_eq!(p.stats_calls(), 0);
    assert!(series.accumulator().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_discards_the_in_flight_chunk() {
    let p = MockConnector::builder()
        .name("sh")
        .delay(Duration::from_secs(1))
        .with_stats_fn(|req| Ok(daily_response(req)))
        .build();
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .max_chunk_span(QUARTER)
        .build()
        .unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(NDVI, false))
        .range(range(day(2021, 1, 1), day(2022, 1, 1)));
    let mut series = orbita.statistics(query).unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        // first chunk lands at 1s, the second is in flight at 1.5s
        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.cancel();
    });
    let report = series.run(&token).await;
    assert_eq!(report.state, SeriesState::Cancelled);
    assert_eq!(p.stats_calls(), 2);
    assert_eq!(series.accumulator().channel(NDVI).unwrap().len(), 90);
    assert_eq!(
        report.covered,
        Some(range(day(2022, 1, 1) - chrono::TimeDelta::days(90), day(2022, 1, 1)))
    );
}
