use std::io::Write;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use periodicals_core::{EndpointConfig, PathsConfig, PeriodicalsConfig};
use periodicals_runtime::proto::{
    contract_season_info, AuthenticatedMessage, Contract, ContractSeasonInfo,
    ContractSeasonInfos, ContractsResponse, CustomEgg, DlcItem, EggIncCurrentEvents, EggIncEvent,
    PeriodicalsResponse,
};
use prost::Message;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PERIODICALS_PATH: &str = "/ei/get_periodicals";
pub const SEASON_INFO_PATH: &str = "/ei_ctx/get_season_infos_v2";
pub const ICON_PATH: &str = "/dlc/egg_carbon_fiber.png";
pub const ICON_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nstub-icon";

/// Answer form-encoded POSTs to `route` with `response`.
pub async fn mount_post(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(body_string_contains("data="))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Answer GETs to `route` with `response`.
pub async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// A successful service answer carrying `message`.
pub fn service_response<M: Message>(message: &M) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_bytes(service_body(message))
}

/// Wrap a message the way the service does: zlib payload in an
/// authenticated envelope, base64 on the wire.
pub fn service_body<M: Message>(message: &M) -> Vec<u8> {
    let payload = message.encode_to_vec();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload).expect("compress");
    let compressed = encoder.finish().expect("finish");
    let envelope = AuthenticatedMessage {
        message: Some(compressed),
        compressed: Some(true),
        original_size: Some(payload.len() as u32),
        ..Default::default()
    };
    STANDARD.encode(envelope.encode_to_vec()).into_bytes()
}

pub fn sample_snapshot(icon_url: &str, now: f64) -> PeriodicalsResponse {
    PeriodicalsResponse {
        events: Some(EggIncCurrentEvents {
            events: vec![EggIncEvent {
                identifier: Some("prestige-boost".into()),
                r#type: Some("prestige-boost".into()),
                subtitle: Some("2x soul eggs".into()),
                multiplier: Some(2.0),
                start_time: Some(now - 3_600.0),
                duration: Some(86_400.0),
                ..Default::default()
            }],
        }),
        contracts: Some(ContractsResponse {
            contracts: vec![
                Contract {
                    identifier: Some("first-contract".into()),
                    expiration_time: Some(now + 1e9),
                    ..Default::default()
                },
                Contract {
                    identifier: Some("winter-wonder".into()),
                    name: Some("Winter Wonder".into()),
                    season_id: Some("winter_2024".into()),
                    start_time: Some(now - 7_200.0),
                    expiration_time: Some(now + 86_400.0),
                    ..Default::default()
                },
            ],
            custom_eggs: vec![
                CustomEgg {
                    identifier: Some("carbon-fiber".into()),
                    name: Some("Carbon Fiber".into()),
                    icon: Some(DlcItem {
                        url: Some(icon_url.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                CustomEgg {
                    identifier: Some("carbon-fiber-remix".into()),
                    name: Some("carbonfiber".into()),
                    icon: Some(DlcItem {
                        url: Some(icon_url.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                CustomEgg {
                    identifier: Some("iconless".into()),
                    name: Some("Iconless".into()),
                    ..Default::default()
                },
            ],
            current_season: Some(ContractSeasonInfo {
                id: Some("winter_2024".into()),
                ..Default::default()
            }),
            ..Default::default()
        }),
    }
}

pub fn sample_season_infos() -> ContractSeasonInfos {
    ContractSeasonInfos {
        infos: vec![ContractSeasonInfo {
            id: Some("winter_2024".into()),
            name: Some("Winter 2024".into()),
            grade_goals: vec![contract_season_info::GoalSet {
                grade: Some(1),
                goals: Vec::new(),
            }],
            ..Default::default()
        }],
    }
}

pub fn sandbox_config(server: &MockServer, dir: &TempDir) -> Arc<PeriodicalsConfig> {
    let config = PeriodicalsConfig::builtin()
        .expect("builtin config")
        .with_user_id("EI0000000000000000")
        .with_endpoints(EndpointConfig::new(
            format!("{}{PERIODICALS_PATH}", server.uri()),
            format!("{}{SEASON_INFO_PATH}", server.uri()),
        ))
        .with_paths(PathsConfig::default().rooted_at(dir.path()));
    Arc::new(config)
}
