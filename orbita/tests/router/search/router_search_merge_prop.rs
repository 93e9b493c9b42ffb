use chrono::TimeDelta;
use proptest::prelude::*;

use orbita::{Orbita, ProviderKey, Record, SearchQuery};
use tokio_util::sync::CancellationToken;

use crate::helpers::{MockConnector, aoi, day, range};

const NAMES: [&str; 4] = ["p0", "p1", "p2", "p3"];

fn records_for(p: usize, hours: &[u16]) -> Vec<Record> {
    hours
        .iter()
        .enumerate()
        .map(|(i, h)| Record {
            provider: ProviderKey::new(NAMES[p]),
            id: format!("{}-{i}", NAMES[p]),
            sensing_time: day(2022, 1, 1) + TimeDelta::hours(i64::from(*h)),
            geometry: aoi(),
            metadata: serde_json::Value::Null,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn federated_output_is_a_stable_descending_merge(
        per_provider in proptest::collection::vec(proptest::collection::vec(0u16..2000, 0..12), 1..=4),
        page_size in 1usize..5,
        batch in 1usize..7,
    ) {
        tokio_test::block_on(async move {
            let mut builder = Orbita::builder().page_size(page_size);
            let mut expected: Vec<Record> = Vec::new();
            for (p, hours) in per_provider.iter().enumerate() {
                let mut recs = records_for(p, hours);
                builder = builder.with_connector(
                    MockConnector::builder().name(NAMES[p]).records(recs.clone()).build(),
                );
                recs.sort_by(|a, b| b.sensing_time.cmp(&a.sensing_time));
                expected.extend(recs);
            }
            expected.sort_by(|a, b| b.sensing_time.cmp(&a.sensing_time));
            let orbita = builder.build().unwrap();

            let query = SearchQuery::new(aoi(), range(day(2021, 12, 1), day(2022, 6, 1)));
            let mut session = orbita.search(query, CancellationToken::new()).unwrap();

            let mut seen: Vec<Record> = Vec::new();
            let mut rounds = 0;
            while session.has_more() && rounds <= expected.len() + 8 {
                let report = session.next_n_results(batch).await;
                assert!(report.warnings.is_empty());
                let out = report.response.unwrap();
                assert!(out.results.len() <= batch);
                seen.extend(out.results);
                rounds += 1;
            }
            assert!(!session.has_more());

            let got: Vec<&str> = seen.iter().map(|r| r.id.as_str()).collect();
            let want: Vec<&str> = expected.iter().map(|r| r.id.as_str()).collect();
            assert_eq!(got, want);
        });
    }
}
