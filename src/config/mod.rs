mod settings;

pub use settings::{
    ApiConfig, HubConfig, JwtConfig, OtelConfig, ServerConfig, Settings, WebSocketConfig,
};
