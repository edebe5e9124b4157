use tokio::io::{AsyncWrite, BufWriter};

use epm_codec::EpmCodec;
use epm_framing::write_stream;
use epm_pipeline::RandomValues;

use super::config::GenerateArgs;
use super::error::GenError;

pub async fn run(args: &GenerateArgs) -> Result<(), GenError> {
    let file = tokio::fs::File::create(&args.out).await.map_err(GenError::file(&args.out))?;
    let mut out = BufWriter::new(file);
    let sink: &mut (dyn AsyncWrite + Unpin + Send) = &mut out;

    let mut source = RandomValues::from_seed(args.seed);
    let bytes = write_stream(&mut [sink], args.count, &mut source, &EpmCodec).await?;

    tracing::info!(out = %args.out, count = args.count, bytes, seed = ?args.seed, "stream written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use epm_framing::parse_stream;

    use super::*;

    #[tokio::test]
    async fn seeded_runs_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.fb").to_string_lossy().into_owned();
        let b = dir.path().join("b.fb").to_string_lossy().into_owned();

        for out in [&a, &b] {
            run(&GenerateArgs { count: 25, out: out.clone(), seed: Some(11) }).await.unwrap();
        }

        let bytes = std::fs::read(&a).unwrap();
        assert_eq!(bytes, std::fs::read(&b).unwrap());
        assert_eq!(parse_stream(&bytes, &EpmCodec).filter(|r| r.is_ok()).count(), 25);
    }

    #[tokio::test]
    async fn unwritable_target_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_string_lossy().into_owned();

        let err = run(&GenerateArgs { count: 1, out, seed: None }).await.unwrap_err();
        assert!(matches!(err, GenError::File { .. }), "{err}");
    }
}
