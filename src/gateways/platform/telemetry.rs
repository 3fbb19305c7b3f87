use super::mapping::{self, HIST_ID_KEY, STATUS_KEY, TYPE_KEY};
use super::PlatformClient;
use crate::gateways::{GatewayResult, TelemetrySource, UserHistorySource};
use crate::models::{DeviceEvent, TimeWindow, UserEvent};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
impl TelemetrySource for PlatformClient {
    async fn latest_status(&self, device_id: &str) -> GatewayResult<Option<Value>> {
        let mut series = self
            .timeseries("DEVICE", device_id, &[STATUS_KEY], None, "device status")
            .await?;
        Ok(mapping::latest_value(&mut series, STATUS_KEY))
    }

    async fn device_events(
        &self,
        device_id: &str,
        window: &TimeWindow,
    ) -> GatewayResult<Vec<DeviceEvent>> {
        let series = self
            .timeseries(
                "DEVICE",
                device_id,
                &[HIST_ID_KEY, TYPE_KEY, STATUS_KEY],
                Some(window),
                "device history",
            )
            .await?;
        Ok(mapping::device_events_from_series(device_id, series))
    }
}

#[async_trait]
impl UserHistorySource for PlatformClient {
    async fn user_events(&self, user_id: &str, window: &TimeWindow) -> GatewayResult<Vec<UserEvent>> {
        let series = self
            .timeseries("USER", user_id, &[HIST_ID_KEY], Some(window), "user history")
            .await?;
        Ok(mapping::user_events_from_series(user_id, series))
    }
}
