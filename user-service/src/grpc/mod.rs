pub mod user_service;

pub use user_service::UserGrpcService;

pub mod proto {
    tonic::include_proto!("svckit.user.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("user_descriptor");
}
