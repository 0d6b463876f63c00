fn main() -> Result<(), Box<dyn std::error::Error>> {
    let provider_proto = "proto/v1alpha1/service.proto";
    println!("cargo:rerun-if-changed={provider_proto}");

    // Prefer an explicitly configured protoc, fall back to the vendored binary.
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()?;
        std::env::set_var("PROTOC", protoc);
    }

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&[provider_proto], &["proto"])?;

    Ok(())
}
