use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use leagueledger_common::error::Error;
use leagueledger_common::traits::directory_traits::TeamDirectory;

/// Team roster kept in memory, keyed by team id.
#[derive(Default)]
pub struct MemoryTeamDirectory {
    teams: DashMap<Uuid, HashSet<Uuid>>,
}

impl MemoryTeamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_team(&self, team_id: Uuid) {
        self.teams.entry(team_id).or_default();
    }

    /// Adds `user_id` to the team, creating the team if needed.
    pub fn add_member(&self, team_id: Uuid, user_id: Uuid) {
        self.teams.entry(team_id).or_default().insert(user_id);
    }

    pub fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> bool {
        self.teams
            .get_mut(&team_id)
            .map(|mut members| members.remove(&user_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl TeamDirectory for MemoryTeamDirectory {
    async fn team_exists(&self, team_id: Uuid) -> Result<bool, Error> {
        Ok(self.teams.contains_key(&team_id))
    }

    async fn is_member(&self, user_id: Uuid, team_id: Uuid) -> Result<bool, Error> {
        Ok(self
            .teams
            .get(&team_id)
            .map(|members| members.contains(&user_id))
            .unwrap_or(false))
    }

    async fn list_team_ids(&self) -> Result<Vec<Uuid>, Error> {
        let mut ids: Vec<Uuid> = self.teams.iter().map(|e| *e.key()).collect();
        ids.sort();
        Ok(ids)
    }

    async fn teams_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, Error> {
        let mut ids: Vec<Uuid> = self
            .teams
            .iter()
            .filter(|e| e.value().contains(&user_id))
            .map(|e| *e.key())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
