// src/api/tournaments.rs
use super::ApiClient;
use crate::error::ApiError;
use crate::models::{LeaderboardEntry, NewTournament, Tournament};
use log::info;

impl ApiClient {
    pub async fn list_tournaments(&self) -> Result<Vec<Tournament>, ApiError> {
        self.send_json(self.get("/tournaments")).await
    }

    pub async fn create_tournament(&self, tournament: &NewTournament) -> Result<Tournament, ApiError> {
        let created: Tournament = self
            .send_json(self.post("/tournaments").json(tournament))
            .await?;
        info!("Created tournament {} ({}).", created.id, created.name);
        Ok(created)
    }

    /// Enters the user, which creates a tournament account for them on the
    /// server. Returns the server's confirmation text.
    pub async fn enter_tournament(&self, tournament_id: i64, user_id: i64) -> Result<String, ApiError> {
        self.send_text(
            self.post(&format!("/tournaments/{tournament_id}/enter"))
                .query(&[("userId", user_id)]),
        )
        .await
    }

    /// Entries come back sorted by cash plus holding value, highest first.
    pub async fn leaderboard(&self, tournament_id: i64) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.send_json(self.get(&format!("/tournaments/{tournament_id}/leaderboard")))
            .await
    }

    pub async fn user_tournaments(&self, user_id: i64) -> Result<Vec<Tournament>, ApiError> {
        self.send_json(self.get(&format!("/tournaments/user/{user_id}")))
            .await
    }
}
