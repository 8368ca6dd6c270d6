use super::SimStore;
use crate::{
    config::ConfigLayer,
    configurator::BootstrapRecorder,
    error::EvResult,
};
use rusqlite::params;

impl SimStore {
    // ── Bootstrap state ───────────────────────────────────────────

    /// Persist every recorded item for the run. Saving a key again replaces it.
    pub fn save_bootstrap(&self, run_id: &str, recorder: &BootstrapRecorder) -> EvResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in recorder.items() {
            tx.execute(
                "INSERT INTO bootstrap_state (run_id, config_key, payload)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (run_id, config_key) DO UPDATE SET payload = excluded.payload",
                params![run_id, key, serde_json::to_string(value)?],
            )?;
        }
        tx.commit()?;
        log::debug!("saved {} bootstrap item(s) for {run_id}", recorder.len());
        Ok(recorder.len())
    }

    pub fn bootstrap_keys(&self, run_id: &str) -> EvResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT config_key FROM bootstrap_state WHERE run_id = ?1 ORDER BY config_key ASC",
        )?;
        let keys = stmt
            .query_map(params![run_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// The run's bootstrap state as a configuration layer, ready to be placed
    /// over the base configuration.
    pub fn load_bootstrap_layer(&self, run_id: &str) -> EvResult<ConfigLayer> {
        let mut stmt = self.conn.prepare(
            "SELECT config_key, payload FROM bootstrap_state WHERE run_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut layer = ConfigLayer::new(format!("bootstrap:{run_id}"));
        for (key, payload) in rows {
            layer.set(key, serde_json::from_str(&payload)?);
        }
        Ok(layer)
    }
}
