//! Derivation of the single platform configuration from the live
//! request set.
//!
//! Every rule picks the strictest constraint present, so the merged
//! subscription satisfies each caller individually. The derivation is a
//! pure fold over the request list; determinism falls out of the total
//! order on [`Priority`] and the numeric minimum/maximum rules.

use crate::data::{MergedSubscription, Priority, Strategy, UpdateRequest};

/// Merge the live request set into one platform configuration.
///
/// Callers never pass an empty slice; an empty set means the engine
/// tears the subscription down instead of reconfiguring it.
pub fn merge(requests: &[UpdateRequest]) -> MergedSubscription {
    debug_assert!(!requests.is_empty(), "merge over an empty request set");

    let priority = requests
        .iter()
        .map(|r| r.accuracy)
        .max()
        .unwrap_or(Priority::NoPower);

    // Only strictly positive filters constrain the platform; a zero
    // filter means "every fix", which is the absence of a filter.
    let smallest_displacement = requests
        .iter()
        .map(|r| r.displacement_filter)
        .filter(|&f| f > 0.0)
        .fold(None, |acc: Option<f32>, f| {
            Some(acc.map_or(f, |a| a.min(f)))
        });

    let interval = min_of(requests, |o| o.interval);
    let fastest_interval = min_of(requests, |o| o.fastest_interval);
    let expiration_time = min_of(requests, |o| o.expiration_time);
    let expiration_duration = min_of(requests, |o| o.expiration_duration);
    let max_wait_time = min_of(requests, |o| o.max_wait_time);

    // A set with no continuous request is satisfied by a single fix.
    // With at least one continuous request the subscription must stay
    // open: unbounded unless every continuous caller bounded itself.
    let any_continuous = requests.iter().any(|r| r.strategy == Strategy::Continuous);
    let num_updates = if any_continuous {
        let any_unbounded = requests
            .iter()
            .filter(|r| r.strategy == Strategy::Continuous)
            .any(|r| r.options.num_updates.is_none());
        if any_unbounded {
            None
        } else {
            requests
                .iter()
                .filter(|r| r.strategy == Strategy::Continuous)
                .filter_map(|r| r.options.num_updates)
                .max()
        }
    } else {
        Some(1)
    };

    MergedSubscription {
        priority,
        smallest_displacement,
        interval,
        fastest_interval,
        expiration_time,
        expiration_duration,
        max_wait_time,
        num_updates,
    }
}

fn min_of(
    requests: &[UpdateRequest],
    field: impl Fn(&crate::data::UpdateOptions) -> Option<u64>,
) -> Option<u64> {
    requests.iter().filter_map(|r| field(&r.options)).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    // The proptest prelude also exports a `Strategy` trait; keep the
    // delivery enum under an unambiguous name here.
    use crate::data::Strategy as Delivery;
    use crate::data::{Permission, UpdateOptions};
    use proptest::prelude::*;

    fn request(id: i32, strategy: Delivery, accuracy: Priority) -> UpdateRequest {
        UpdateRequest {
            id,
            strategy,
            permission: Permission::WhenInUse,
            accuracy,
            in_background: false,
            displacement_filter: 0.0,
            options: UpdateOptions::default(),
        }
    }

    #[test]
    fn test_priority_takes_maximum() {
        let requests = vec![
            request(1, Delivery::Continuous, Priority::Low),
            request(2, Delivery::Continuous, Priority::High),
            request(3, Delivery::Continuous, Priority::Balanced),
        ];
        assert_eq!(merge(&requests).priority, Priority::High);
    }

    #[test]
    fn test_displacement_ignores_zero_filters() {
        let mut a = request(1, Delivery::Continuous, Priority::High);
        a.displacement_filter = 0.0;
        let mut b = request(2, Delivery::Continuous, Priority::High);
        b.displacement_filter = 25.0;
        let mut c = request(3, Delivery::Continuous, Priority::High);
        c.displacement_filter = 10.0;

        assert_eq!(merge(&[a, b, c]).smallest_displacement, Some(10.0));
    }

    #[test]
    fn test_displacement_none_when_all_zero() {
        let requests = vec![
            request(1, Delivery::Continuous, Priority::High),
            request(2, Delivery::Continuous, Priority::Low),
        ];
        assert_eq!(merge(&requests).smallest_displacement, None);
    }

    #[test]
    fn test_intervals_take_minimum_of_present() {
        let mut a = request(1, Delivery::Continuous, Priority::High);
        a.options.interval = Some(5000);
        a.options.fastest_interval = Some(1000);
        let mut b = request(2, Delivery::Continuous, Priority::High);
        b.options.interval = Some(2000);

        let merged = merge(&[a, b]);
        assert_eq!(merged.interval, Some(2000));
        assert_eq!(merged.fastest_interval, Some(1000));
        assert_eq!(merged.max_wait_time, None);
    }

    #[test]
    fn test_single_shot_set_caps_at_one_update() {
        let requests = vec![
            request(1, Delivery::Current, Priority::Balanced),
            request(2, Delivery::Single, Priority::High),
        ];
        assert_eq!(merge(&requests).num_updates, Some(1));
    }

    #[test]
    fn test_unbounded_continuous_wins() {
        let mut a = request(1, Delivery::Continuous, Priority::High);
        a.options.num_updates = Some(10);
        let b = request(2, Delivery::Continuous, Priority::High);

        assert_eq!(merge(&[a, b]).num_updates, None);
    }

    #[test]
    fn test_bounded_continuous_takes_maximum() {
        let mut a = request(1, Delivery::Continuous, Priority::High);
        a.options.num_updates = Some(10);
        let mut b = request(2, Delivery::Continuous, Priority::High);
        b.options.num_updates = Some(3);
        let c = request(3, Delivery::Single, Priority::High);

        assert_eq!(merge(&[a, b, c]).num_updates, Some(10));
    }

    fn arb_priority() -> BoxedStrategy<Priority> {
        prop_oneof![
            Just(Priority::NoPower),
            Just(Priority::Low),
            Just(Priority::Balanced),
            Just(Priority::High),
        ]
        .boxed()
    }

    fn arb_strategy() -> BoxedStrategy<crate::data::Strategy> {
        prop_oneof![
            Just(Delivery::Current),
            Just(Delivery::Single),
            Just(Delivery::Continuous),
        ]
        .boxed()
    }

    prop_compose! {
        fn arb_request()(
            id in 0i32..100,
            strategy in arb_strategy(),
            accuracy in arb_priority(),
            filter in prop_oneof![Just(0.0f32), 0.1f32..5000.0],
            interval in proptest::option::of(1u64..100_000),
            num_updates in proptest::option::of(1u32..50),
        ) -> UpdateRequest {
            let mut r = request(id, strategy, accuracy);
            r.displacement_filter = filter;
            r.options.interval = interval;
            r.options.num_updates = num_updates;
            r
        }
    }

    proptest! {
        #[test]
        fn prop_merged_config_satisfies_every_request(
            requests in proptest::collection::vec(arb_request(), 1..8)
        ) {
            let merged = merge(&requests);

            for r in &requests {
                prop_assert!(merged.priority >= r.accuracy);
                if let Some(interval) = r.options.interval {
                    prop_assert!(merged.interval.unwrap() <= interval);
                }
                if r.displacement_filter > 0.0 {
                    prop_assert!(merged.smallest_displacement.unwrap() <= r.displacement_filter);
                }
            }

            let any_continuous = requests
                .iter()
                .any(|r| r.strategy == Delivery::Continuous);
            if !any_continuous {
                prop_assert_eq!(merged.num_updates, Some(1));
            }
        }

        #[test]
        fn prop_merge_is_order_independent(
            requests in proptest::collection::vec(arb_request(), 1..8)
        ) {
            let forward = merge(&requests);
            let mut reversed = requests.clone();
            reversed.reverse();
            prop_assert_eq!(forward, merge(&reversed));
        }
    }
}
