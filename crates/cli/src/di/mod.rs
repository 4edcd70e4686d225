use mapserver_dns_application::ports::MapClient;
use mapserver_dns_application::services::ProofValidator;
use mapserver_dns_application::use_cases::ServeProofUseCase;
use mapserver_dns_domain::MapserverSettings;
use mapserver_dns_infrastructure::map_client::TcpMapClient;
use std::sync::Arc;
use tracing::info;

pub struct ProofServices {
    pub serve_proof: Arc<ServeProofUseCase>,
}

impl ProofServices {
    pub fn new(settings: &MapserverSettings) -> Self {
        info!(
            base_zone = %settings.base_zone,
            map_address = %settings.map_address,
            tree_id = settings.tree_id,
            public_key = %settings.public_key,
            max_receive_message_size = settings.max_receive_message_size,
            query_timeout_ms = settings.query_timeout.as_millis() as u64,
            "Initializing proof services"
        );

        let map_client: Arc<dyn MapClient> = Arc::new(TcpMapClient::from_settings(settings));
        let validator = ProofValidator::new(
            settings.tree_id,
            settings.public_key,
            settings.tree_nonce.clone(),
        );

        Self {
            serve_proof: Arc::new(ServeProofUseCase::new(
                map_client,
                validator,
                settings.base_zone.clone(),
            )),
        }
    }
}
