fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);

    // Server and client, plus a descriptor set for reflection
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("add_descriptor.bin"))
        .compile_protos(&["../proto/svckit/add/v1/add.proto"], &["../proto"])?;

    println!("cargo:rerun-if-changed=../proto/svckit/add/v1/add.proto");

    Ok(())
}
