//! Norm resolution: select the applicable standard-rate norms for a
//! plantation in a financial year.
//!
//! Candidates are matched on the plantation's age. When no norm exists at
//! the exact age, resolution falls back to the nearest lower
//! `applicable_age` that has candidates. Within an activity, a
//! species-specific norm beats a species-agnostic one.

use chrono::{Datelike, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use apo_db::models::Plantation;
use apo_db::queries::norms::{self, NormWithActivity};
use apo_db::queries::plantations;

use crate::error::{CoreError, Result};

/// The outcome of norm resolution: the plantation, its computed age, and
/// the winning norm per activity.
#[derive(Debug, Clone)]
pub struct ResolvedNorms {
    pub plantation: Plantation,
    pub age: i32,
    pub financial_year: String,
    pub norms: Vec<NormWithActivity>,
}

/// Compute a plantation's age in years. A planting year in the future is
/// malformed input.
pub fn plantation_age(year_of_planting: i32, current_year: i32) -> Result<i32> {
    if year_of_planting > current_year {
        return Err(CoreError::Validation(format!(
            "year of planting {year_of_planting} is in the future"
        )));
    }
    Ok(current_year - year_of_planting)
}

/// Resolve the species tie-break: for each activity keep the
/// species-specific candidate when one exists, else the species-agnostic
/// one. Input order is preserved for the surviving rows.
///
/// Callers must pre-filter candidates to the plantation's species (the
/// query only returns rows with `species IS NULL` or the exact species).
pub fn apply_species_precedence(candidates: Vec<NormWithActivity>) -> Vec<NormWithActivity> {
    let mut chosen: Vec<NormWithActivity> = Vec::with_capacity(candidates.len());
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for norm in candidates {
        match index.get(&norm.activity_id) {
            None => {
                index.insert(norm.activity_id, chosen.len());
                chosen.push(norm);
            }
            Some(&i) => {
                if chosen[i].species.is_none() && norm.species.is_some() {
                    chosen[i] = norm;
                }
            }
        }
    }

    chosen
}

/// Resolve the applicable norm set for a plantation and financial year.
///
/// Pure read: no side effects. A plantation with no norm at or below its
/// age resolves to an empty set; the draft generator decides what that
/// means.
pub async fn resolve(
    pool: &PgPool,
    plantation_id: Uuid,
    financial_year: &str,
) -> Result<ResolvedNorms> {
    let plantation = plantations::get_plantation(pool, plantation_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("plantation {plantation_id}")))?;

    let age = plantation_age(plantation.year_of_planting, Utc::now().year())?;

    let mut candidates =
        norms::candidates_at_age(pool, financial_year, age, &plantation.species).await?;

    // No exact-age norms: cascade to the nearest lower applicable age.
    if candidates.is_empty() && age > 0 {
        if let Some(fallback_age) =
            norms::nearest_lower_age(pool, financial_year, age, &plantation.species).await?
        {
            tracing::debug!(
                plantation = %plantation_id,
                age,
                fallback_age,
                "no exact-age norms; falling back to nearest lower age"
            );
            candidates =
                norms::candidates_at_age(pool, financial_year, fallback_age, &plantation.species)
                    .await?;
        }
    }

    let norms = apply_species_precedence(candidates);

    Ok(ResolvedNorms {
        plantation,
        age,
        financial_year: financial_year.to_owned(),
        norms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(activity_id: Uuid, species: Option<&str>, rate: f64) -> NormWithActivity {
        NormWithActivity {
            id: Uuid::new_v4(),
            activity_id,
            applicable_age: 3,
            species: species.map(str::to_owned),
            standard_rate: rate,
            financial_year: "2026-27".to_owned(),
            activity_name: "Weeding".to_owned(),
            category: "Maintenance".to_owned(),
            unit: "Per Hectare".to_owned(),
            ssr_no: None,
        }
    }

    #[test]
    fn age_normal() {
        assert_eq!(plantation_age(2020, 2026).unwrap(), 6);
    }

    #[test]
    fn age_zero_for_current_year() {
        assert_eq!(plantation_age(2026, 2026).unwrap(), 0);
    }

    #[test]
    fn age_future_year_rejected() {
        let err = plantation_age(2030, 2026).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn species_specific_wins_over_agnostic() {
        let activity = Uuid::new_v4();
        let picked = apply_species_precedence(vec![
            candidate(activity, None, 100.0),
            candidate(activity, Some("Teak"), 120.0),
        ]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].species.as_deref(), Some("Teak"));
        assert_eq!(picked[0].standard_rate, 120.0);
    }

    #[test]
    fn species_specific_wins_regardless_of_order() {
        let activity = Uuid::new_v4();
        let picked = apply_species_precedence(vec![
            candidate(activity, Some("Teak"), 120.0),
            candidate(activity, None, 100.0),
        ]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].species.as_deref(), Some("Teak"));
    }

    #[test]
    fn agnostic_survives_alone() {
        let activity = Uuid::new_v4();
        let picked = apply_species_precedence(vec![candidate(activity, None, 100.0)]);
        assert_eq!(picked.len(), 1);
        assert!(picked[0].species.is_none());
    }

    #[test]
    fn activities_are_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let picked = apply_species_precedence(vec![
            candidate(a, None, 100.0),
            candidate(b, Some("Teak"), 200.0),
            candidate(a, Some("Teak"), 150.0),
        ]);
        assert_eq!(picked.len(), 2);
        let rate_a = picked.iter().find(|n| n.activity_id == a).unwrap();
        assert_eq!(rate_a.standard_rate, 150.0);
    }
}
