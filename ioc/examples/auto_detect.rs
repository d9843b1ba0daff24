//! Satisfying unregistered contracts from exported catalogs.

use tiered_ioc::{
  candidate, export_catalog, injectable, ContainerBuilder, ContainerOptions, Inject,
};

trait Greeter: Send + Sync {
  fn greet(&self, name: &str) -> String;
}

trait Punctuation: Send + Sync {
  fn mark(&self) -> &'static str;
}

#[derive(Default)]
struct Exclaim;
injectable!(Exclaim);

impl Punctuation for Exclaim {
  fn mark(&self) -> &'static str {
    "!"
  }
}

#[derive(Default)]
struct EnglishGreeter {
  punctuation: Inject<dyn Punctuation>,
}
injectable!(EnglishGreeter { punctuation });

impl Greeter for EnglishGreeter {
  fn greet(&self, name: &str) -> String {
    format!("Hello, {}{}", name, self.punctuation.mark())
  }
}

export_catalog!(static GREETING = "greeting" [
  candidate!(dyn Greeter => EnglishGreeter),
  candidate!(dyn Punctuation => Exclaim),
]);

fn main() -> tiered_ioc::Result<()> {
  let options = ContainerOptions::from_yaml_str(
    r#"
auto_detection:
  enabled: true
  catalogs: [greeting]
"#,
  )?;
  let container = ContainerBuilder::new().with_options(&options)?.build();

  // Resolved from the container, so both detected services become singletons.
  let greeter = container.get::<dyn Greeter>()?;
  println!("{}", greeter.greet("world"));
  println!("{} singletons cached", container.singleton_count());
  Ok(())
}
