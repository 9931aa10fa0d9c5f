fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile proto files with file descriptor for reflection
    #[cfg(feature = "grpc")]
    {
        let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);

        tonic_build::configure()
            .build_server(true)
            .build_client(true)
            .file_descriptor_set_path(out_dir.join("ecoloop_descriptor.bin"))
            .compile_protos(
                &[
                    "proto/common.proto",
                    "proto/auth.proto",
                    "proto/items.proto",
                    "proto/health.proto",
                ],
                &["proto"],
            )?;
    }

    // Rerun if proto files or embedded migrations change
    println!("cargo:rerun-if-changed=proto/");
    println!("cargo:rerun-if-changed=migrations/");

    Ok(())
}
