pub mod string_service;

pub use string_service::StringGrpcService;

pub mod proto {
    tonic::include_proto!("svckit.string.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("string_descriptor");
}
