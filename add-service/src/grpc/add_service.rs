use service_core::domain::err2str;
use service_core::grpc::IntoStatus;
use tonic::{Request, Response, Status};

use crate::endpoints::{AddEndpoints, ConcatRequest, SumRequest};
use crate::grpc::proto::{self, add_server::Add};

pub struct AddGrpcService {
    endpoints: AddEndpoints,
}

impl AddGrpcService {
    pub fn new(endpoints: AddEndpoints) -> Self {
        Self { endpoints }
    }
}

#[tonic::async_trait]
impl Add for AddGrpcService {
    async fn sum(
        &self,
        request: Request<proto::SumRequest>,
    ) -> Result<Response<proto::SumReply>, Status> {
        let req = request.into_inner();
        let resp = self
            .endpoints
            .sum
            .call(SumRequest { a: req.a, b: req.b })
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::SumReply {
            v: resp.v,
            err: err2str(resp.err.as_ref()),
        }))
    }

    async fn concat(
        &self,
        request: Request<proto::ConcatRequest>,
    ) -> Result<Response<proto::ConcatReply>, Status> {
        let req = request.into_inner();
        let resp = self
            .endpoints
            .concat
            .call(ConcatRequest { a: req.a, b: req.b })
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::ConcatReply {
            v: resp.v,
            err: err2str(resp.err.as_ref()),
        }))
    }
}
