//! Default catalog of known exercises.
//!
//! This module provides the built-in exercise definitions the journal
//! checks logged names against, plus merging of user-defined additions
//! from the config file.

use crate::config::Config;
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of built-in exercises
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns
/// a cached reference. This function is retained for testing and custom
/// catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn spec(name: &str, category: ExerciseCategory, targets: &[&str]) -> ExerciseSpec {
    ExerciseSpec {
        name: name.to_string(),
        category,
        targets: targets.iter().map(|t| t.to_string()).collect(),
    }
}

fn build_default_catalog_internal() -> Catalog {
    let mut exercises = BTreeMap::new();

    let defaults = [
        // ====================================================================
        // Lifting
        // ====================================================================
        spec(
            "Bench Press",
            ExerciseCategory::Lifting,
            &["chest", "triceps", "shoulders"],
        ),
        spec(
            "Incline Dumbbell Press",
            ExerciseCategory::Lifting,
            &["chest", "shoulders"],
        ),
        spec(
            "Squats",
            ExerciseCategory::Lifting,
            &["quads", "glutes", "core"],
        ),
        spec(
            "Romanian Deadlifts",
            ExerciseCategory::Lifting,
            &["hamstrings", "glutes"],
        ),
        spec(
            "Deadlifts",
            ExerciseCategory::Lifting,
            &["posterior_chain", "back", "grip"],
        ),
        spec(
            "Overhead Press",
            ExerciseCategory::Lifting,
            &["shoulders", "triceps"],
        ),
        spec(
            "Pull-ups",
            ExerciseCategory::Lifting,
            &["back", "biceps"],
        ),
        // ====================================================================
        // Cardio
        // ====================================================================
        spec("Treadmill", ExerciseCategory::Cardio, &["endurance"]),
        spec(
            "Rowing Machine",
            ExerciseCategory::Cardio,
            &["endurance", "back", "legs"],
        ),
        spec(
            "Stairmaster",
            ExerciseCategory::Cardio,
            &["endurance", "legs"],
        ),
        spec("Cycling", ExerciseCategory::Cardio, &["endurance", "legs"]),
    ];

    for s in defaults {
        exercises.insert(s.name.to_lowercase(), s);
    }

    Catalog { exercises }
}

impl Catalog {
    /// Build the default catalog merged with the user's custom exercises
    ///
    /// A custom exercise with the same name as a built-in one replaces it.
    pub fn with_custom(config: &Config) -> Self {
        let mut catalog = build_default_catalog_internal();
        for custom in &config.exercises.custom {
            tracing::debug!("Adding custom exercise '{}' to catalog", custom.name);
            catalog
                .exercises
                .insert(custom.name.to_lowercase(), custom.clone());
        }
        catalog
    }

    /// Look up an exercise by name, case-insensitively
    pub fn find(&self, name: &str) -> Option<&ExerciseSpec> {
        self.exercises.get(&name.trim().to_lowercase())
    }

    /// Validate the catalog, returning a list of problems (empty when clean)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, spec) in &self.exercises {
            if spec.name.trim().is_empty() {
                errors.push(format!("exercise '{}' has an empty name", key));
            }
            if key != &spec.name.to_lowercase() {
                errors.push(format!(
                    "exercise '{}' is keyed as '{}' instead of its lowercase name",
                    spec.name, key
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = build_default_catalog();
        assert!(catalog.validate().is_empty());
        assert!(!catalog.exercises.is_empty());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let catalog = build_default_catalog();
        assert!(catalog.find("bench press").is_some());
        assert!(catalog.find("BENCH PRESS").is_some());
        assert!(catalog.find("  Bench Press  ").is_some());
        assert!(catalog.find("Zercher Squat").is_none());
    }

    #[test]
    fn test_categories_present() {
        let catalog = build_default_catalog();
        assert_eq!(
            catalog.find("Squats").unwrap().category,
            ExerciseCategory::Lifting
        );
        assert_eq!(
            catalog.find("Treadmill").unwrap().category,
            ExerciseCategory::Cardio
        );
    }

    #[test]
    fn test_custom_exercises_merge_and_override() {
        let mut config = Config::default();
        config.exercises.custom.push(ExerciseSpec {
            name: "Sled Push".into(),
            category: ExerciseCategory::Cardio,
            targets: vec!["legs".into()],
        });
        config.exercises.custom.push(ExerciseSpec {
            name: "Squats".into(),
            category: ExerciseCategory::Lifting,
            targets: vec!["quads".into()],
        });

        let catalog = Catalog::with_custom(&config);
        assert!(catalog.find("Sled Push").is_some());
        // Custom definition replaces the built-in one
        assert_eq!(catalog.find("Squats").unwrap().targets, vec!["quads"]);
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_cached_catalog_matches_built() {
        let cached = get_default_catalog();
        let built = build_default_catalog();
        assert_eq!(cached.exercises.len(), built.exercises.len());
    }
}
