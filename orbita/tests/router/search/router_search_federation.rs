use orbita::{ImageryConnector, Months, Orbita, SearchQuery};
use tokio_util::sync::CancellationToken;

use crate::helpers::{MockConnector, aoi, day, dt, range, rec};

fn ids(records: &[orbita::Record]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

#[tokio::test]
async fn later_sub_range_is_exhausted_before_earlier_one() {
    // July holds [5,3,1] from "a" and [4,2] from "b"; January holds [0] from "a".
    let a = MockConnector::builder()
        .name("a")
        .records(vec![
            rec("a", dt(2022, 7, 5)),
            rec("a", dt(2022, 7, 3)),
            rec("a", dt(2022, 7, 1)),
            rec("a", dt(2022, 1, 15)),
        ])
        .build();
    let b = MockConnector::builder()
        .name("b")
        .records(vec![rec("b", dt(2022, 7, 4)), rec("b", dt(2022, 7, 2))])
        .build();

    let orbita = Orbita::builder()
        .with_connector(a)
        .with_connector(b)
        .page_size(2)
        .build()
        .unwrap();

    let query = SearchQuery::new(aoi(), range(day(2022, 1, 1), day(2023, 1, 1)))
        .months(Months::JANUARY | Months::JULY);
    let mut session = orbita.search(query, CancellationToken::new()).unwrap();

    let report = session.next_n_results(10).await;
    assert!(report.warnings.is_empty());
    let batch = report.response.expect("not cancelled");
    let days: Vec<(u32, u32)> = batch
        .results
        .iter()
        .map(|r| {
            use chrono::Datelike;
            (r.sensing_time.month(), r.sensing_time.day())
        })
        .collect();
    assert_eq!(days, vec![(7, 5), (7, 4), (7, 3), (7, 2), (7, 1), (1, 15)]);
    assert!(!batch.has_more);
    assert!(!session.has_more());
}

#[tokio::test]
async fn small_batches_concatenate_without_gaps_or_duplicates() {
    let a_records: Vec<_> = (1..=9).map(|d| rec("a", dt(2022, 3, d * 3))).collect();
    let b_records: Vec<_> = (1..=6).map(|d| rec("b", dt(2022, 3, d * 4 + 1))).collect();
    let a = MockConnector::builder()
        .name("a")
        .records(a_records.clone())
        .build();
    let b = MockConnector::builder()
        .name("b")
        .records(b_records.clone())
        .build();
    let orbita = Orbita::builder()
        .with_connector(a)
        .with_connector(b)
        .page_size(4)
        .build()
        .unwrap();

    let query = SearchQuery::new(aoi(), range(day(2022, 3, 1), day(2022, 4, 1)));
    let mut session = orbita.search(query, CancellationToken::new()).unwrap();

    let mut seen = Vec::new();
    while session.has_more() {
        let batch = session.next_n_results(2).await.response.unwrap();
        assert!(batch.results.len() <= 2);
        seen.extend(batch.results);
    }

    let mut expected: Vec<_> = a_records.into_iter().chain(b_records).collect();
    expected.sort_by(|x, y| y.sensing_time.cmp(&x.sensing_time));
    assert_eq!(ids(&seen), ids(&expected));
    assert!(seen.windows(2).all(|w| w[0].sensing_time >= w[1].sensing_time));
}

#[tokio::test]
async fn equal_sensing_times_follow_registration_order() {
    let t = dt(2022, 5, 10);
    let first = MockConnector::builder()
        .name("first")
        .records(vec![rec("first", t)])
        .build();
    let second = MockConnector::builder()
        .name("second")
        .records(vec![rec("second", t)])
        .build();
    let orbita = Orbita::builder()
        .with_connector(second)
        .with_connector(first)
        .build()
        .unwrap();

    let query = SearchQuery::new(aoi(), range(day(2022, 5, 1), day(2022, 6, 1)));
    let mut session = orbita.search(query, CancellationToken::new()).unwrap();
    let batch = session.next_n_results(5).await.response.unwrap();
    let providers: Vec<&str> = batch.results.iter().map(|r| r.provider.as_str()).collect();
    assert_eq!(providers, vec!["second", "first"]);
}

#[tokio::test]
async fn pages_are_fetched_only_when_needed() {
    let records: Vec<_> = (1..=10).map(|d| rec("a", dt(2022, 8, d))).collect();
    let a = MockConnector::builder().name("a").records(records).build();
    let orbita = Orbita::builder()
        .with_connector(a.clone())
        .page_size(3)
        .build()
        .unwrap();

    let query = SearchQuery::new(aoi(), range(day(2022, 8, 1), day(2022, 9, 1)));
    let mut session = orbita.search(query, CancellationToken::new()).unwrap();
    assert_eq!(a.search_calls(), 0);

    let batch = session.next_n_results(3).await.response.unwrap();
    assert_eq!(batch.results.len(), 3);
    assert!(batch.has_more);
    assert_eq!(a.search_calls(), 1);

    let batch = session.next_n_results(1).await.response.unwrap();
    assert_eq!(batch.results.len(), 1);
    assert_eq!(a.search_calls(), 2);
}

#[tokio::test]
async fn provider_restriction_limits_fan_out() {
    let a = MockConnector::builder()
        .name("a")
        .records(vec![rec("a", dt(2022, 2, 2))])
        .build();
    let b = MockConnector::builder()
        .name("b")
        .records(vec![rec("b", dt(2022, 2, 3))])
        .build();
    let orbita = Orbita::builder()
        .with_connector(a.clone())
        .with_connector(b.clone())
        .build()
        .unwrap();

    let query = SearchQuery::new(aoi(), range(day(2022, 2, 1), day(2022, 3, 1)))
        .providers(&[a.key()]);
    let mut session = orbita.search(query, CancellationToken::new()).unwrap();
    let batch = session.next_n_results(10).await.response.unwrap();
    assert_eq!(ids(&batch.results), vec![format!("a@{}", dt(2022, 2, 2).timestamp())]);
    assert_eq!(b.search_calls(), 0);
}
