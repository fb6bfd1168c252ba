pub mod add_service;

pub use add_service::AddGrpcService;

pub mod proto {
    tonic::include_proto!("svckit.add.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("add_descriptor");
}
