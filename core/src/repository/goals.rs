use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::default_data_dir;
use crate::error::{Error, Result};
use crate::model::goal::{AnnualGoal, Goal, GoalPatch};
use crate::repository::storage::{read_json, write_json_atomic};
use crate::repository::traits::GoalRepository;

const DEFAULT_FILE_NAME: &str = "goals.json";

#[derive(Serialize, Deserialize, Debug, Default)]
struct GoalFile {
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    annual_goals: BTreeMap<i32, AnnualGoal>,
}

#[derive(Clone)]
pub struct FileGoalRepository {
    file_path: PathBuf,
}

impl FileGoalRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut path = match base_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        fs::create_dir_all(&path)?;
        path.push(DEFAULT_FILE_NAME);

        Ok(FileGoalRepository { file_path: path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }

    fn read_file(&self) -> Result<GoalFile> {
        Ok(read_json(&self.file_path)?.unwrap_or_default())
    }

    fn write_file(&self, file: &GoalFile) -> Result<()> {
        write_json_atomic(&self.file_path, file)?;
        debug!(path = %self.file_path.display(), goals = file.goals.len(), "goals saved");
        Ok(())
    }
}

fn not_found(id: &Uuid) -> Error {
    Error::NotFound(format!("Goal with ID {} not found", id))
}

impl GoalRepository for FileGoalRepository {
    fn add(&self, goal: Goal) -> Result<Uuid> {
        let mut file = self.read_file()?;
        let id = goal.id;
        file.goals.push(goal);
        self.write_file(&file)?;
        Ok(id)
    }

    fn list(&self) -> Result<Vec<Goal>> {
        Ok(self.read_file()?.goals)
    }

    fn get(&self, id: &Uuid) -> Result<Goal> {
        self.read_file()?
            .goals
            .into_iter()
            .find(|g| g.id == *id)
            .ok_or_else(|| not_found(id))
    }

    fn edit(&self, id: &Uuid, patch: &GoalPatch) -> Result<Goal> {
        let mut file = self.read_file()?;
        let goal = file
            .goals
            .iter_mut()
            .find(|g| g.id == *id)
            .ok_or_else(|| not_found(id))?;
        goal.apply(patch);
        let updated = goal.clone();
        self.write_file(&file)?;
        Ok(updated)
    }

    fn delete(&self, id: &Uuid) -> Result<()> {
        let mut file = self.read_file()?;
        let initial_len = file.goals.len();
        file.goals.retain(|g| g.id != *id);

        if file.goals.len() == initial_len {
            return Err(not_found(id));
        }

        self.write_file(&file)
    }

    fn resolve_id(&self, prefix: &str) -> Result<Uuid> {
        let prefix = prefix.trim().to_lowercase();
        if let Ok(id) = Uuid::parse_str(&prefix) {
            return Ok(id);
        }
        if prefix.is_empty() {
            return Err(Error::Validation("Goal ID must not be empty".into()));
        }

        let matches: Vec<Uuid> = self
            .read_file()?
            .goals
            .iter()
            .map(|g| g.id)
            .filter(|id| id.to_string().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(Error::NotFound(format!("No goal matches ID '{}'", prefix))),
            _ => Err(Error::Validation(format!(
                "Goal ID '{}' is ambiguous ({} matches)",
                prefix,
                matches.len()
            ))),
        }
    }

    fn set_annual(&self, goal: AnnualGoal) -> Result<()> {
        let mut file = self.read_file()?;
        file.annual_goals.insert(goal.year, goal);
        self.write_file(&file)
    }

    fn annual(&self, year: i32) -> Result<Option<AnnualGoal>> {
        Ok(self.read_file()?.annual_goals.remove(&year))
    }

    fn list_annual(&self) -> Result<Vec<AnnualGoal>> {
        Ok(self.read_file()?.annual_goals.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::goal::GoalType;
    use crate::units::{DistanceUnit, Unit};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_goal(title: &str) -> Goal {
        Goal::new(
            Some(title.to_string()),
            GoalType::Distance,
            500.0,
            Unit::Km,
            d(2025, 1, 1),
            d(2025, 6, 30),
        )
    }

    #[test]
    fn test_add_then_get_returns_goal_unchanged() {
        let dir = tempdir().unwrap();
        let repo = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();

        let goal = sample_goal("Spring base");
        let id = repo.add(goal.clone()).unwrap();
        assert_eq!(id, goal.id);
        assert_eq!(repo.get(&id).unwrap(), goal);
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let dir = tempdir().unwrap();
        let repo = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();

        let id = repo.add(sample_goal("Spring base")).unwrap();
        repo.delete(&id).unwrap();
        assert!(matches!(repo.get(&id), Err(Error::NotFound(_))));
        assert!(matches!(repo.delete(&id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let dir = tempdir().unwrap();
        let repo = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();

        for title in ["a", "b", "c"] {
            repo.add(sample_goal(title)).unwrap();
        }
        let titles: Vec<String> = repo.list().unwrap().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_edit_merges_fields_and_persists() {
        let dir = tempdir().unwrap();
        let repo = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();
        let id = repo.add(sample_goal("Spring base")).unwrap();

        let patch = GoalPatch {
            title: Some("Summer base".into()),
            ..Default::default()
        };
        let updated = repo.edit(&id, &patch).unwrap();
        assert_eq!(updated.title, "Summer base");
        assert_eq!(updated.target, 500.0);

        let reopened = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(reopened.get(&id).unwrap().title, "Summer base");
        assert!(matches!(
            repo.edit(&Uuid::new_v4(), &patch),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_id_prefix() {
        let dir = tempdir().unwrap();
        let repo = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();
        let goal = sample_goal("Spring base");
        let id = repo.add(goal.clone()).unwrap();

        assert_eq!(repo.resolve_id(&goal.short_id()).unwrap(), id);
        assert_eq!(repo.resolve_id(&id.to_string()).unwrap(), id);
        assert!(matches!(repo.resolve_id("zzzz"), Err(Error::NotFound(_))));
        assert!(repo.resolve_id("").is_err());
    }

    #[test]
    fn test_annual_goals() {
        let dir = tempdir().unwrap();
        let repo = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();

        assert!(repo.annual(2025).unwrap().is_none());
        repo.set_annual(AnnualGoal { year: 2025, distance: 5000.0, unit: DistanceUnit::Km }).unwrap();
        repo.set_annual(AnnualGoal { year: 2025, distance: 4000.0, unit: DistanceUnit::Miles }).unwrap();
        repo.set_annual(AnnualGoal { year: 2024, distance: 3000.0, unit: DistanceUnit::Km }).unwrap();

        let goal = repo.annual(2025).unwrap().unwrap();
        assert_eq!(goal.distance, 4000.0);
        assert_eq!(goal.unit, DistanceUnit::Miles);
        let years: Vec<i32> = repo.list_annual().unwrap().iter().map(|g| g.year).collect();
        assert_eq!(years, vec![2024, 2025]);
    }

    #[test]
    fn test_malformed_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let repo = FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap();
        fs::write(repo.path(), r#"{"goals": [{"id": "nope"}]}"#).unwrap();

        match repo.list() {
            Err(Error::Corrupt { path, .. }) => assert_eq!(&path, repo.path()),
            other => panic!("expected corrupt error, got {:?}", other),
        }
    }
}
