use ferrous_ioc::config::{Config, ConfigValue, MapConfigSource};
use ferrous_ioc::{
    constructable, key_of_type, share, Container, DiError, Implementation, Parameter, Resolver,
};
use std::sync::Arc;

trait Filesystem: Send + Sync {
    fn name(&self) -> &'static str;
}

struct LocalDisk;
impl Filesystem for LocalDisk {
    fn name(&self) -> &'static str {
        "local"
    }
}

struct S3Disk;
impl Filesystem for S3Disk {
    fn name(&self) -> &'static str {
        "s3"
    }
}

type Disk = Arc<dyn Filesystem>;

fn disk(value: impl Filesystem + 'static) -> ferrous_ioc::AnyArc {
    share(Arc::new(value) as Disk)
}

#[test]
fn contextual_binding_only_affects_its_consumer() {
    struct PhotoController {
        disk: Arc<Disk>,
    }
    struct VideoController {
        disk: Arc<Disk>,
    }
    constructable::<PhotoController>("PhotoController")
        .param(Parameter::inject("disk", "filesystem"))
        .register(|args| Ok(PhotoController { disk: args.get::<Disk>(0)? }));
    constructable::<VideoController>("VideoController")
        .param(Parameter::inject("disk", "filesystem"))
        .register(|args| Ok(VideoController { disk: args.get::<Disk>(0)? }));

    let container = Container::new();
    container.bind("filesystem", |_, _| Ok(disk(LocalDisk))).unwrap();
    container
        .when_type::<PhotoController>()
        .needs("filesystem")
        .give(Implementation::factory(|_, _| Ok(disk(S3Disk))))
        .unwrap();

    let photos = container.make_type::<PhotoController>().unwrap();
    let videos = container.make_type::<VideoController>().unwrap();
    assert_eq!(photos.disk.name(), "s3");
    assert_eq!(videos.disk.name(), "local");
    assert_eq!(container.make_as::<Disk>("filesystem").unwrap().name(), "local");
}

#[test]
fn contextual_binding_for_several_consumers() {
    struct First {
        disk: Arc<Disk>,
    }
    struct Second {
        disk: Arc<Disk>,
    }
    constructable::<First>("First")
        .param(Parameter::inject("disk", "filesystem"))
        .register(|args| Ok(First { disk: args.get::<Disk>(0)? }));
    constructable::<Second>("Second")
        .param(Parameter::inject("disk", "filesystem"))
        .register(|args| Ok(Second { disk: args.get::<Disk>(0)? }));

    let container = Container::new();
    container.instance("filesystem", Arc::new(LocalDisk) as Disk).unwrap();
    container.instance("s3", Arc::new(S3Disk) as Disk).unwrap();
    container
        .when_any([key_of_type::<First>(), key_of_type::<Second>()])
        .needs("filesystem")
        .give(ferrous_ioc::Key::from("s3"))
        .unwrap();

    assert_eq!(container.make_type::<First>().unwrap().disk.name(), "s3");
    assert_eq!(container.make_type::<Second>().unwrap().disk.name(), "s3");
}

#[test]
fn contextual_class_implementation_is_built() {
    struct RedisCache;
    struct Repository {
        cache: Arc<RedisCache>,
    }
    constructable::<RedisCache>("RedisCache").register(|_| Ok(RedisCache));
    constructable::<Repository>("Repository")
        .param(Parameter::inject("cache", "cache"))
        .register(|args| Ok(Repository { cache: args.get::<RedisCache>(0)? }));

    let container = Container::new();
    container
        .when_type::<Repository>()
        .needs("cache")
        .give(Implementation::class::<RedisCache>())
        .unwrap();

    let repository = container.make_type::<Repository>().unwrap();
    let _: &RedisCache = &repository.cache;
    // The bare abstract stays unbound outside the consumer
    assert!(container.make("cache").is_err());
}

#[test]
fn contextual_binding_resolves_through_aliases() {
    struct Consumer {
        value: Arc<&'static str>,
    }
    constructable::<Consumer>("Consumer")
        .param(Parameter::inject("value", "impl"))
        .register(|args| Ok(Consumer { value: args.get::<&'static str>(0)? }));

    let container = Container::new();
    container.bind("impl", |_, _| Ok(share("plain"))).unwrap();
    // Registered against the alias before the alias exists
    container
        .when_type::<Consumer>()
        .needs("impl.alias")
        .give(Implementation::value("contextual"))
        .unwrap();
    container.alias("impl", "impl.alias").unwrap();

    assert_eq!(*container.make_type::<Consumer>().unwrap().value, "contextual");
}

#[test]
fn need_registered_through_alias_is_normalised() {
    struct Consumer {
        value: Arc<&'static str>,
    }
    constructable::<Consumer>("AliasedNeedConsumer")
        .param(Parameter::inject("value", "impl"))
        .register(|args| Ok(Consumer { value: args.get::<&'static str>(0)? }));

    let container = Container::new();
    container.bind("impl", |_, _| Ok(share("plain"))).unwrap();
    container.alias("impl", "impl.alias").unwrap();
    container
        .when_type::<Consumer>()
        .needs("impl.alias")
        .give(Implementation::value("contextual"))
        .unwrap();

    assert_eq!(*container.make_type::<Consumer>().unwrap().value, "contextual");
}

#[test]
fn contextual_primitive_by_parameter_name() {
    struct Report {
        format: String,
        pages: i64,
    }
    constructable::<Report>("Report")
        .params([
            Parameter::primitive("format"),
            Parameter::primitive("pages").default(1i64),
        ])
        .register(|args| {
            Ok(Report {
                format: args.cloned::<String>(0)?,
                pages: *args.get::<i64>(1)?,
            })
        });

    let container = Container::new();
    match container.make_type::<Report>() {
        Err(DiError::Unresolvable { index, name, class }) => {
            assert_eq!((index, name.as_str(), class.as_str()), (0, "format", "Report"));
        }
        other => panic!("expected unresolvable, got {:?}", other.err()),
    }

    container
        .when_type::<Report>()
        .needs("format")
        .give(Implementation::value(String::from("pdf")))
        .unwrap();
    let report = container.make_type::<Report>().unwrap();
    assert_eq!(report.format, "pdf");
    assert_eq!(report.pages, 1);
}

#[test]
fn contextual_array_fills_variadic_parameter() {
    struct Filter(&'static str);
    struct NullFilter;
    struct Firewall {
        filters: Vec<Arc<Filter>>,
    }
    constructable::<Firewall>("Firewall")
        .param(Parameter::class::<NullFilter>("filters").variadic())
        .register(|args| Ok(Firewall { filters: args.rest::<Filter>(0)? }));

    let container = Container::new();
    container.bind("profanity", |_, _| Ok(share(Filter("profanity")))).unwrap();
    container.bind("too_long", |_, _| Ok(share(Filter("too_long")))).unwrap();

    container
        .when_type::<Firewall>()
        .needs(key_of_type::<NullFilter>())
        .give(Implementation::many([
            Implementation::Abstract("profanity".into()),
            Implementation::Abstract("too_long".into()),
        ]))
        .unwrap();

    let firewall = container.make_type::<Firewall>().unwrap();
    let names: Vec<&str> = firewall.filters.iter().map(|f| f.0).collect();
    assert_eq!(names, vec!["profanity", "too_long"]);
}

#[test]
fn give_tagged_splices_tag_members() {
    struct Report(&'static str);
    struct ReportAggregator {
        reports: Vec<Arc<Report>>,
    }
    struct ReportMarker;
    constructable::<ReportAggregator>("ReportAggregator")
        .param(Parameter::class::<ReportMarker>("reports").variadic())
        .register(|args| Ok(ReportAggregator { reports: args.rest::<Report>(0)? }));

    let container = Container::new();
    container.bind("report.cpu", |_, _| Ok(share(Report("cpu")))).unwrap();
    container.bind("report.memory", |_, _| Ok(share(Report("memory")))).unwrap();
    container.tag(["report.cpu", "report.memory"], ["reports"]);
    container
        .when_type::<ReportAggregator>()
        .needs(key_of_type::<ReportMarker>())
        .give_tagged("reports")
        .unwrap();

    let aggregator = container.make_type::<ReportAggregator>().unwrap();
    let names: Vec<&str> = aggregator.reports.iter().map(|r| r.0).collect();
    assert_eq!(names, vec!["cpu", "memory"]);
}

#[test]
fn give_config_reads_repository() {
    struct Mailer {
        driver: ConfigValue,
        from: ConfigValue,
    }
    constructable::<Mailer>("Mailer")
        .params([Parameter::primitive("driver"), Parameter::primitive("from")])
        .register(|args| {
            Ok(Mailer {
                driver: args.cloned::<ConfigValue>(0)?,
                from: args.cloned::<ConfigValue>(1)?,
            })
        });

    let container = Container::new();
    container
        .instance(
            "config",
            Config::new().with_source(MapConfigSource::new().set("mail.driver", "smtp")),
        )
        .unwrap();
    container
        .when_type::<Mailer>()
        .needs("driver")
        .give_config("mail.driver", ConfigValue::from("log"))
        .unwrap();
    container
        .when_type::<Mailer>()
        .needs("from")
        .give_config("mail.from", ConfigValue::from("noreply@example.com"))
        .unwrap();

    let mailer = container.make_type::<Mailer>().unwrap();
    assert_eq!(mailer.driver, ConfigValue::from("smtp"));
    assert_eq!(mailer.from, ConfigValue::from("noreply@example.com"));
}

#[test]
fn give_without_need_is_a_usage_error() {
    let container = Container::new();
    let err = container
        .when("Consumer")
        .give(Implementation::value(1u8))
        .unwrap_err();
    assert_eq!(err.to_string(), "Please provide a need, before give!");
}
