pub mod data {
    pub mod datasources {
        pub(crate) mod app_store_server_api_datasource;
        pub(crate) mod app_store_server_notification_datasource;
        pub(crate) mod bearer_token;
        pub mod transport;
    }
    pub mod models {
        pub mod app_store_server_api {
            pub mod common;
            pub mod consumption_request_model;
            pub mod error_response_model;
            pub mod history_query;
            pub mod history_response_model;
            pub mod jws_renewal_info_decoded_payload_model;
            pub mod jws_transaction_decoded_payload_model;
            pub mod millis_timestamp;
            pub mod notification_history_model;
            pub mod order_lookup_response_model;
            pub mod refund_history_response_model;
            pub mod renewal_extension_model;
            pub mod send_test_notification_response;
            pub mod status_response_model;
            pub mod transaction_info_response_model;
        }
        pub mod app_store_server_notifications {
            pub mod response_body_v2_decoded_payload_model;
            pub mod response_body_v2_model;
        }
    }
    pub(crate) mod repositories {
        pub(crate) mod app_store_repository_impl;
    }
    pub mod verification {
        pub mod decode_protocol;
        pub mod jws_verifier;
        pub mod trust_store;

        #[cfg(test)]
        pub(crate) mod test_support;
    }
}

pub mod domain {
    pub mod entities {
        pub mod decode_outcome;
        pub mod signed_slot;
    }
    pub mod repositories {
        pub mod app_store_repository;
    }
}

pub mod config;
pub mod errors;
pub mod util;
