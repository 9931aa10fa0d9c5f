// Generated by tonic-build into OUT_DIR (see build.rs)

pub mod common {
    tonic::include_proto!("ecoloop.common");
}

pub mod auth {
    tonic::include_proto!("ecoloop.auth");
}

pub mod items {
    tonic::include_proto!("ecoloop.items");
}

pub mod health {
    tonic::include_proto!("grpc.health.v1");
}

/// Encoded descriptors for gRPC reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("ecoloop_descriptor");
