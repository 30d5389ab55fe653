use chrono::NaiveDate;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;

use crate::error::RiskError;
use crate::scoring::{HealthProfile, RiskAssessment, RiskEngine};
use crate::series::DataLoader;

/// Outcome of assessing one profile in a batch.
pub type ProfileOutcome = (HealthProfile, Result<RiskAssessment, RiskError>);

/// Assess several profiles for one date concurrently.
///
/// The date is loaded once and every profile is scored against that same
/// data on the blocking pool. A load failure (including no data) is
/// reported for each profile, and one profile's failure never aborts the
/// others. Results come back in the order the profiles were given.
pub async fn assess_profiles(
    engine: &RiskEngine,
    loader: Arc<dyn DataLoader>,
    date: NaiveDate,
    profiles: &[HealthProfile],
) -> Vec<ProfileOutcome> {
    let loaded = match tokio::task::spawn_blocking(move || loader.load(date)).await {
        Ok(result) => result,
        Err(e) => Err(RiskError::Task(e.to_string())),
    };
    let data = match loaded {
        Ok(data) => Arc::new(data),
        Err(e) => {
            tracing::error!("Error loading data for {}: {}", date, e);
            return profiles.iter().map(|p| (*p, Err(e.clone()))).collect();
        }
    };

    let mut futures = FuturesUnordered::new();
    for (index, profile) in profiles.iter().copied().enumerate() {
        let engine = engine.clone();
        let data = Arc::clone(&data);
        futures.push(async move {
            let handle =
                tokio::task::spawn_blocking(move || engine.assess_profile(profile, date, &data));
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(RiskError::Task(e.to_string())),
            };
            (index, profile, result)
        });
    }

    let mut outcomes = Vec::with_capacity(profiles.len());
    while let Some((index, profile, result)) = futures.next().await {
        match &result {
            Ok(assessment) => tracing::debug!(
                "Assessed {}: score {}, confidence {:.2}",
                profile,
                assessment.final_score,
                assessment.confidence
            ),
            Err(e) => tracing::error!("Error calculating risk for {}: {}", profile, e),
        }
        outcomes.push((index, profile, result));
    }

    outcomes.sort_by_key(|(index, _, _)| *index);
    outcomes
        .into_iter()
        .map(|(_, profile, result)| (profile, result))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Catalog;
    use crate::series::{EnvironmentalVariable, MemoryLoader, SeriesSet, TimeSeries};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 5).unwrap()
    }

    fn day_data() -> SeriesSet {
        let start = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap();
        let mut set = SeriesSet::new();
        set.insert(
            EnvironmentalVariable::Pm2p5,
            TimeSeries::from_values(start, Duration::hours(1), &[45.0; 24]).unwrap(),
        );
        set
    }

    fn engine() -> RiskEngine {
        RiskEngine::new(Arc::new(Catalog::default()))
    }

    /// Counts how often the date is loaded.
    struct CountingLoader {
        inner: MemoryLoader,
        calls: AtomicUsize,
    }

    impl DataLoader for CountingLoader {
        fn load(&self, date: NaiveDate) -> Result<SeriesSet, RiskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.load(date)
        }
    }

    #[tokio::test]
    async fn test_results_in_requested_order() {
        let loader: Arc<dyn DataLoader> = Arc::new(MemoryLoader::new().with_day(date(), day_data()));
        let outcomes = assess_profiles(&engine(), loader, date(), &HealthProfile::ALL).await;

        let order: Vec<_> = outcomes.iter().map(|(p, _)| *p).collect();
        assert_eq!(order, HealthProfile::ALL.to_vec());
        assert!(outcomes.iter().all(|(_, r)| r.is_ok()));
    }

    #[tokio::test]
    async fn test_no_data_reported_per_profile() {
        let loader: Arc<dyn DataLoader> = Arc::new(MemoryLoader::new());
        let profiles = [HealthProfile::Copd, HealthProfile::Lupus];
        let outcomes = assess_profiles(&engine(), loader, date(), &profiles).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, r)| matches!(r, Err(e) if e.is_no_data())));
    }

    #[tokio::test]
    async fn test_date_loaded_once_per_batch() {
        let counting = Arc::new(CountingLoader {
            inner: MemoryLoader::new().with_day(date(), day_data()),
            calls: AtomicUsize::new(0),
        });
        let loader: Arc<dyn DataLoader> = counting.clone();
        let outcomes = assess_profiles(&engine(), loader, date(), &HealthProfile::ALL).await;

        assert_eq!(outcomes.len(), HealthProfile::ALL.len());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_others() {
        // Pregnancy has no catalog entry, so only it fails
        let mut catalog = Catalog::default();
        catalog.profiles.remove(&HealthProfile::Pregnancy);
        let engine = RiskEngine::new(Arc::new(catalog));

        let loader: Arc<dyn DataLoader> = Arc::new(MemoryLoader::new().with_day(date(), day_data()));
        let profiles = [HealthProfile::Copd, HealthProfile::Pregnancy, HealthProfile::Lupus];
        let outcomes = assess_profiles(&engine, loader, date(), &profiles).await;

        assert!(outcomes[0].1.is_ok());
        assert!(matches!(
            outcomes[1].1,
            Err(RiskError::UnknownProfile(HealthProfile::Pregnancy))
        ));
        assert!(outcomes[2].1.is_ok());
    }
}
