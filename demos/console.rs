use std::{sync::Arc, time::SystemTime};

use locus::*;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
}

trait DateLogger: Send + Sync {
    fn log_date(&self);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, content: &str) {
        println!("{}", content);
    }
}

struct PrefixLogger(&'static str);

impl Logger for PrefixLogger {
    fn log(&self, content: &str) {
        println!("[{}] {}", self.0, content);
    }
}

struct DateLoggerImpl {
    logger: Arc<dyn Logger>,
}

impl DateLoggerImpl {
    // resolve our own dependencies through whichever injector we are given
    fn new(injector: &dyn Inject) -> Result<Self, WiringError> {
        Ok(Self {
            logger: injector.inject::<DateLoggerImpl, _>()?,
        })
    }
}

impl DateLogger for DateLoggerImpl {
    fn log_date(&self) {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.logger.log(&format!("{}s since epoch", secs));
    }
}

struct Console;

fn main() -> Result<(), WiringError> {
    // Registration order does not matter, as long as everything is registered before use
    locator::try_register_singleton(|| {
        DateLoggerImpl::new(&Injector).map(|d| Arc::new(d) as Arc<dyn DateLogger>)
    });
    locator::register(|consumer| {
        if consumer.is::<DateLoggerImpl>() {
            Arc::new(PrefixLogger("date")) as Arc<dyn Logger>
        } else {
            Arc::new(ConsoleLogger) as Arc<dyn Logger>
        }
    });

    let logger: Arc<dyn Logger> = locator::inject::<Console, _>()?;
    logger.log("resolved a plain logger");

    let dates: Arc<dyn DateLogger> = locator::inject::<Console, _>()?;
    dates.log_date();

    // Swap the logger for a double without touching the global registrations
    let overlay = TestOverlay::new();
    overlay.register_test_double(|_| Arc::new(PrefixLogger("double")) as Arc<dyn Logger>);
    DateLoggerImpl::new(&overlay)?.log_date();

    locator::reset();
    if let Err(e) = locator::inject::<Console, Arc<dyn Logger>>() {
        println!("after reset: {}", e);
    }

    Ok(())
}
