use service_core::domain::err2str;
use service_core::grpc::IntoStatus;
use tonic::{Request, Response, Status};

use crate::endpoints::{CountRequest, StringEndpoints, UppercaseRequest};
use crate::grpc::proto::{self, string_service_server::StringService};

pub struct StringGrpcService {
    endpoints: StringEndpoints,
}

impl StringGrpcService {
    pub fn new(endpoints: StringEndpoints) -> Self {
        Self { endpoints }
    }
}

#[tonic::async_trait]
impl StringService for StringGrpcService {
    async fn uppercase(
        &self,
        request: Request<proto::UppercaseRequest>,
    ) -> Result<Response<proto::UppercaseReply>, Status> {
        let resp = self
            .endpoints
            .uppercase
            .call(UppercaseRequest {
                s: request.into_inner().s,
            })
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::UppercaseReply {
            v: resp.v,
            err: err2str(resp.err.as_ref()),
        }))
    }

    async fn count(
        &self,
        request: Request<proto::CountRequest>,
    ) -> Result<Response<proto::CountReply>, Status> {
        let resp = self
            .endpoints
            .count
            .call(CountRequest {
                s: request.into_inner().s,
            })
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::CountReply { v: resp.v }))
    }
}
