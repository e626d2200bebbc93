use std::path::PathBuf;

use clap::Parser;
use dis::{
    ColorCache, ColorId, Dispatch, ExecState, ExecStateCreateInfo, ExportTable, Import,
    ModuleImage, ModuleImageCreateInfo, ModuleRegistry, ThemeStore, ThemeStoreCreateInfo,
    ValueKind, format_rgba, link, sig_of,
};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "dis", about = "Dis module linking and theme store demo")]
struct Args {
    /// User theme profile directory (shadows the system directory)
    #[arg(long, default_value = "themes")]
    user_themes: PathBuf,

    /// System theme profile directory
    #[arg(long, default_value = "themes")]
    system_themes: PathBuf,

    /// Profile to load at startup
    #[arg(long)]
    profile: Option<String>,
}

fn sys_add(state: &mut ExecState) {
    let b = state.pop().expect("add needs two operands");
    let a = state.pop().expect("add needs two operands");
    state.push(a + b);
}

fn sys_print(state: &mut ExecState) {
    let v = state.pop().expect("print needs an operand");
    println!("{v}");
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let registry = ModuleRegistry::new();

    let sig_add = sig_of(&[ValueKind::Word, ValueKind::Word], &[ValueKind::Word]);
    let sig_print = sig_of(&[ValueKind::Word], &[]);

    let mut exports = ExportTable::new();
    exports.runtime("add", sig_add, sys_add, None);
    exports.runtime("print", sig_print, sys_print, None);
    let sys = registry.register(ModuleImage::builtin(
        ModuleImageCreateInfo {
            name: "sys".to_string(),
            path: "$Sys".to_string(),
            ..Default::default()
        },
        exports,
    ));

    let imports = [
        Import::new("add", sig_add),
        Import::new("print", sig_print),
    ];
    let linked = link(&sys, &imports, true).expect("demo imports link against sys");
    info!("linked {} slots against {}", linked.links.len(), sys.name);

    let mut state = ExecState::new(&ExecStateCreateInfo { stack_size: 16 });
    state.push(5);
    state.push(77);
    for slot in &linked.links {
        if let Dispatch::Native(f) = slot.dispatch {
            f(&mut state);
        }
    }

    let store = ThemeStore::new(ThemeStoreCreateInfo {
        user_root: args.user_themes,
        system_root: args.system_themes,
    });
    store.register_redraw(|| info!("redraw broadcast"));

    if let Some(name) = &args.profile {
        if let Err(e) = store.load_profile(name) {
            eprintln!("{e}");
        }
    }

    println!("profiles: {}", store.list_profiles().join(" "));
    println!("active:   {}", store.profile());

    let mut cache = ColorCache::new(&store);
    for id in [
        ColorId::Foreground,
        ColorId::Background,
        ColorId::Select,
        ColorId::TitleBackground,
    ] {
        println!("{:18} {}", id.name(), format_rgba(cache.get(&store, id)));
    }
}
