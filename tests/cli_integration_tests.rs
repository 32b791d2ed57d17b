//! CLI integration tests for the hyperextract tool.
//!
//! These drive the built binary end to end: extraction, config runs and stats.

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

use hyperextract::HyperEdges;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hyperextract"))
}

fn write_fixtures(dir: &Path) -> Result<()> {
    fs::write(dir.join("contigs.sizes"), "A\t10000\nB\t10000\nC\t10000\n")?;
    fs::write(
        dir.join("sample.pairs"),
        "## pairs format v1.0\n\
         r1\tA\t100\tB\t200\t+\t-\t30\n\
         r2\tA\t50\tC\t9999\t+\t+\t10\n\
         r3\tB\t10\tC\t20\t+\t+\t60\n",
    )?;
    fs::write(
        dir.join("sample.porec"),
        "0\t800\t0\t100\t+\tA\t0\t10\t60\t0.9\tpass\n\
         0\t800\t0\t100\t+\tB\t0\t10\t60\t0.9\tpass\n\
         0\t800\t0\t100\t+\tC\t0\t10\t60\t0.9\tpass\n",
    )?;
    Ok(())
}

#[test]
fn test_cli_pairs_extraction() -> Result<()> {
    let dir = tempdir()?;
    write_fixtures(dir.path())?;
    let output = dir.path().join("sample.hg");

    let status = bin()
        .args(["pairs", "-i"])
        .arg(dir.path().join("sample.pairs"))
        .arg("-c")
        .arg(dir.path().join("contigs.sizes"))
        .arg("-o")
        .arg(&output)
        .args(["-q", "20", "-e", "0", "-t", "2"])
        .status()?;
    assert!(status.success());

    let edges = HyperEdges::load(&output)?;
    assert_eq!(edges.row, vec![0, 1, 1, 2]);
    assert_eq!(edges.col, vec![0, 0, 1, 1]);
    assert_eq!(edges.mapq, vec![30, 30, 60, 60]);

    let side_table = fs::read_to_string(dir.path().join("sample.contigsizes"))?;
    assert_eq!(side_table, "A\t10000\nB\t10000\nC\t10000\n");
    Ok(())
}

#[test]
fn test_cli_porec_split_and_stats() -> Result<()> {
    let dir = tempdir()?;
    write_fixtures(dir.path())?;
    let output = dir.path().join("porec.hg");

    let status = bin()
        .args(["porec", "-i"])
        .arg(dir.path().join("sample.porec"))
        .arg("-c")
        .arg(dir.path().join("contigs.sizes"))
        .arg("-o")
        .arg(&output)
        .args(["-s", "2"])
        .status()?;
    assert!(status.success());

    let edges = HyperEdges::load(&output)?;
    assert_eq!(edges.num_vertices(), 6);
    assert_eq!(edges.num_hyperedges(), 1);

    let out = bin().args(["stats", "-i"]).arg(&output).output()?;
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout)?;
    assert!(stdout.contains("hyperedges\t1"));
    assert!(stdout.contains("incidences\t3"));
    assert!(stdout.contains("order_3\t1"));
    Ok(())
}

#[test]
fn test_cli_from_config() -> Result<()> {
    let dir = tempdir()?;
    write_fixtures(dir.path())?;

    let config_path = dir.path().join("extract.toml");
    fs::write(
        &config_path,
        r#"
[extract]
kind = "pairs"
inputs = ["sample.pairs"]
contigsizes = "contigs.sizes"
output = "from_config.hg"
min_quality = 20
edge_length = 0
threads = 1
"#,
    )?;

    let status = bin().arg("from-config").arg(&config_path).status()?;
    assert!(status.success());

    let edges = HyperEdges::load(&dir.path().join("from_config.hg"))?;
    assert_eq!(edges.num_hyperedges(), 2);
    Ok(())
}

#[test]
fn test_cli_fails_on_empty_input() -> Result<()> {
    let dir = tempdir()?;
    write_fixtures(dir.path())?;
    let empty = dir.path().join("empty.pairs");
    fs::write(&empty, "## pairs format v1.0\n")?;
    let output = dir.path().join("empty.hg");

    let out = bin()
        .args(["pairs", "-i"])
        .arg(&empty)
        .arg("-c")
        .arg(dir.path().join("contigs.sizes"))
        .arg("-o")
        .arg(&output)
        .output()?;

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("empty"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_cli_rejects_output_named_like_side_table() -> Result<()> {
    let dir = tempdir()?;
    write_fixtures(dir.path())?;
    let output = dir.path().join("sample.contigsizes");

    let out = bin()
        .args(["pairs", "-i"])
        .arg(dir.path().join("sample.pairs"))
        .arg("-c")
        .arg(dir.path().join("contigs.sizes"))
        .arg("-o")
        .arg(&output)
        .output()?;

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("overwritten"));
    assert!(!output.exists());
    Ok(())
}
