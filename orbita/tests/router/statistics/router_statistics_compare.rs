use std::time::Duration;

use orbita::{
    ChannelSeries, ImageryConnector, MIXED_LAYER_COUNT, Orbita, OrbitaError, RenderMode,
    SeriesState, StatisticsQuery, StatisticsResponse,
};
use tokio_util::sync::CancellationToken;

use crate::helpers::{CLOUD, MockConnector, NDVI, aoi, daily_response, day, output, range, sample};

const TRUE_COLOR: &str = "TRUE_COLOR";

fn layered() -> std::sync::Arc<MockConnector> {
    MockConnector::builder()
        .name("sh")
        .with_stats_fn(|req| {
            if req.output.layer == TRUE_COLOR {
                let d = req.range.start().date_naive();
                Ok(StatisticsResponse::ok(vec![
                    ChannelSeries::new("B04", vec![sample(d, 0.0, 0.1)]),
                    ChannelSeries::new("B03", vec![sample(d, 0.0, 0.1)]),
                    ChannelSeries::new("B02", vec![sample(d, 0.0, 0.1)]),
                    ChannelSeries::new(CLOUD, vec![sample(d, 0.0, 0.0)]),
                ]))
            } else {
                Ok(daily_response(req))
            }
        })
        .build()
}

#[tokio::test]
async fn overflowing_layer_is_unavailable_without_affecting_siblings() {
    let p = layered();
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .render_mode(RenderMode::Compare { max_channels: 1 })
        .build()
        .unwrap();
    let window = range(day(2022, 1, 1), day(2022, 3, 1));
    let queries = vec![
        StatisticsQuery::new(p.key(), aoi(), output(NDVI, true)).range(window),
        StatisticsQuery::new(p.key(), aoi(), output(TRUE_COLOR, true)).range(window),
    ];

    let fetchers = orbita
        .compare_statistics(queries, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(fetchers.len(), 2);

    let ndvi = fetchers[0].report();
    assert_eq!(ndvi.state, SeriesState::Satisfied);
    assert_eq!(fetchers[0].accumulator().channel(NDVI).unwrap().len(), 59);

    let rgb = fetchers[1].report();
    assert_eq!(
        rgb.state,
        SeriesState::Unavailable {
            reason: MIXED_LAYER_COUNT.into()
        }
    );
    assert!(fetchers[1].accumulator().is_empty());
}

#[tokio::test]
async fn single_mode_renders_every_channel() {
    let p = layered();
    let orbita = Orbita::builder().with_connector(p.clone()).build().unwrap();
    let query = StatisticsQuery::new(p.key(), aoi(), output(TRUE_COLOR, true))
        .range(range(day(2022, 1, 1), day(2022, 3, 1)));
    let mut series = orbita.statistics(query).unwrap();
    let report = series.run(&CancellationToken::new()).await;
    assert!(report.state.is_satisfied());
    assert_eq!(series.accumulator().primary_count(), 3);
    assert_eq!(series.derive().channels.len(), 3);
}

#[tokio::test]
async fn auxiliary_threshold_filters_each_layer_independently() {
    let p = layered();
    let orbita = Orbita::builder()
        .with_connector(p.clone())
        .max_auxiliary_value(10)
        .render_mode(RenderMode::Compare { max_channels: 3 })
        .build()
        .unwrap();
    let window = range(day(2022, 1, 1), day(2022, 1, 11));
    let fetchers = orbita
        .compare_statistics(
            vec![
                StatisticsQuery::new(p.key(), aoi(), output(NDVI, true)).range(window),
                StatisticsQuery::new(p.key(), aoi(), output(TRUE_COLOR, true)).range(window),
            ],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // NDVI days are 20% cloudy, above the 10% threshold
    let ndvi = fetchers[0].derive();
    assert!(ndvi.channels[0].points.is_empty());
    assert_eq!(ndvi.channels[0].value_range, None);

    let rgb = fetchers[1].derive();
    assert_eq!(rgb.channels.len(), 3);
    assert!(rgb.channels.iter().all(|c| c.points.len() == 1));
}

#[tokio::test]
async fn empty_compare_is_rejected() {
    let orbita = Orbita::builder().with_connector(layered()).build().unwrap();
    let err = orbita
        .compare_statistics(vec![], &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OrbitaError::InvalidArg(_)));
}

#[tokio::test(start_paused = true)]
async fn request_deadline_maps_to_statistics_timeout() {
    let slow = MockConnector::builder()
        .name("slow")
        .delay(Duration::from_secs(30))
        .with_stats_fn(|req| Ok(daily_response(req)))
        .build();
    let orbita = Orbita::builder()
        .with_connector(slow.clone())
        .request_timeout(Duration::from_secs(1))
        .provider_timeout(Duration::from_secs(60))
        .build()
        .unwrap();
    let query = StatisticsQuery::new(slow.key(), aoi(), output(NDVI, false))
        .range(range(day(2022, 1, 1), day(2022, 2, 1)));
    let err = orbita
        .compare_statistics(vec![query], &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, OrbitaError::request_timeout("statistics"));
}
