//! Built-in demonstration suite

use simpletap::{Suite, TestCase, TestContext, TestResult};

fn ratio(total: i32, count: i32) -> i32 {
    total / count
}

fn test_addition(ctx: &mut TestContext) -> TestResult {
    ctx.assert_eq(2 + 2, 4)?;
    Ok(())
}

fn test_comparison(ctx: &mut TestContext) -> TestResult {
    ctx.assert_eq("apple", "orange")?;
    Ok(())
}

fn test_division(_ctx: &mut TestContext) -> TestResult {
    let count = std::hint::black_box(0);
    let _ = ratio(10, count);
    Ok(())
}

fn test_parse(_ctx: &mut TestContext) -> TestResult {
    let port: u16 = "eighty".parse()?;
    let _ = port;
    Ok(())
}

fn test_known_bug(ctx: &mut TestContext) -> TestResult {
    ctx.assert_true(0.1 + 0.2 == 0.3)?;
    Ok(())
}

fn test_with_cleanup(ctx: &mut TestContext) -> TestResult {
    let dir = std::env::temp_dir().join("simpletap-demo");
    std::fs::create_dir_all(&dir)?;
    ctx.add_cleanup(move |_| {
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    });
    ctx.assert_true(true)?;
    Ok(())
}

pub fn suite() -> Suite {
    Suite::new("Demo")
        .suite(
            Suite::new("Basics")
                .case(TestCase::new("test_addition", test_addition).narrative("Adding numbers"))
                .case(
                    TestCase::new("test_comparison", test_comparison)
                        .narrative("Comparing strings\n\nThe strings differ on purpose."),
                )
                .case(TestCase::new("test_division", test_division).narrative("Dividing by zero")),
        )
        .suite(
            Suite::new("Directives")
                .case(
                    TestCase::new("test_network", |_| Ok(()))
                        .narrative("Talking to the network")
                        .skip("Network access disabled"),
                )
                .case(TestCase::new("test_runtime_skip", |ctx| {
                    Err(ctx.skip("Decided at runtime"))
                }))
                .case(
                    TestCase::new("test_known_bug", test_known_bug)
                        .narrative("Floating point equality")
                        .expected_failure(),
                ),
        )
        .suite(
            Suite::new("Fixtures")
                .set_up(|ctx| {
                    ctx.add_cleanup(|_| Ok(()));
                    Ok(())
                })
                .case(TestCase::new("test_with_cleanup", test_with_cleanup))
                .case(TestCase::new("test_parse", test_parse).narrative("Parsing a port")),
        )
}
