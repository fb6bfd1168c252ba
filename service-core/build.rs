use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = PathBuf::from("../proto");

    // Tell cargo to recompile if any proto files change
    println!("cargo:rerun-if-changed=../proto/svckit/add/v1/");
    println!("cargo:rerun-if-changed=../proto/svckit/string/v1/");
    println!("cargo:rerun-if-changed=../proto/svckit/user/v1/");

    // Client stubs only; each service compiles its own server side.
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["../proto/svckit/add/v1/add.proto"], &[&proto_root])?;

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["../proto/svckit/string/v1/string.proto"], &[&proto_root])?;

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["../proto/svckit/user/v1/user.proto"], &[&proto_root])?;

    Ok(())
}
