//! Configuration file loader.
//!
//! Walks the XML element tree keeping a parse stack of grammar frames. Each
//! frame holds the set of elements its children may be; handlers run on
//! element open and close and build the [`Model`] in place.
//!
//! A `<codec_probe>` can redirect loading to another file. The current file
//! is abandoned at `</codec_probe>` and the next one is parsed from the top
//! with everything accumulated so far (model, path names, init controls)
//! carried over.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};

use audioroute_core::{
    Case, CodecCase, CodecProbe, Constant, Ctl, CtlIndex, CtlValue, Device, DynArray, Error,
    HwStream, Model, PathId, Result, Stream, StreamId, StreamPool, StreamType, UseCase,
    VolumeControl, devices, parse_i32, parse_u32,
};
use audioroute_mixer::{Mixer, MixerOpener, apply_ctls, bind, bind_volume};

use crate::grammar::{
    AFTER_MIXER_CHILDREN, Attr, Attrs, Element, INIT_EXCLUDES, MAX_PARSE_DEPTH, ROOT_CHILDREN,
    extract_attrs, match_element,
};
use crate::options::LoaderOptions;
use crate::{paths, probe};

/// Instance cap of a stream that does not declare `instances`.
pub const UNLIMITED_INSTANCES: u32 = 0x7FFF_FFFF;

/// A compiled configuration and the mixer it was bound against.
pub struct LoadedConfig {
    /// The compiled model.
    pub model: Model,
    /// Mixer left open after `<init>` was applied.
    pub mixer: Box<dyn Mixer>,
    /// Card the mixer is open on.
    pub card: u32,
}

impl std::fmt::Debug for LoadedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedConfig")
            .field("model", &self.model)
            .field("card", &self.card)
            .finish_non_exhaustive()
    }
}

/// Load a configuration file.
///
/// Relative paths are taken against the current directory. Any error drops
/// everything built so far.
pub fn load(
    file: impl AsRef<Path>,
    opener: &dyn MixerOpener,
    options: &LoaderOptions,
) -> Result<LoadedConfig> {
    let mut file = paths::absolutize(file.as_ref());
    let mut loader = Loader::new(opener, options)?;

    loop {
        tracing::info!(file = %file.display(), "reading configuration");
        match loader.parse_file(&file)? {
            Flow::Finished => break,
            Flow::Redirect(next) => {
                tracing::info!(from = %file.display(), to = %next.display(), "codec probe redirect");
                file = next;
            }
        }
    }

    loader.finish()
}

/// Load `audio.<product>.xml` from the options' `etc_dir`.
pub fn load_product(
    product: &str,
    opener: &dyn MixerOpener,
    options: &LoaderOptions,
) -> Result<LoadedConfig> {
    load(
        paths::product_config_path(&options.etc_dir, product),
        opener,
        options,
    )
}

enum Flow {
    Finished,
    Redirect(PathBuf),
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    element: Option<Element>,
    children: u32,
}

/// Entities the open elements refer to.
#[derive(Debug, Default)]
struct Cursor {
    device: Option<usize>,
    path: Option<usize>,
    stream: Option<StreamId>,
    usecase: Option<usize>,
    case: Option<usize>,
}

struct Loader<'a> {
    opener: &'a dyn MixerOpener,
    options: &'a LoaderOptions,
    model: Model,
    mixer: Option<Box<dyn Mixer>>,
    card: u32,
    init: DynArray<Ctl>,
    preinit: DynArray<Ctl>,
    probe: Option<CodecProbe>,
    file: PathBuf,
    visited: Vec<PathBuf>,
    stack: Vec<Frame>,
    cursor: Cursor,
}

impl<'a> Loader<'a> {
    fn new(opener: &'a dyn MixerOpener, options: &'a LoaderOptions) -> Result<Self> {
        let mut model = Model::new();
        model.path_names.push("off".to_owned())?;
        model.path_names.push("on".to_owned())?;

        Ok(Self {
            opener,
            options,
            model,
            mixer: None,
            card: 0,
            init: DynArray::new(),
            preinit: DynArray::new(),
            probe: None,
            file: PathBuf::new(),
            visited: Vec::new(),
            stack: Vec::with_capacity(MAX_PARSE_DEPTH + 1),
            cursor: Cursor::default(),
        })
    }

    fn parse_file(&mut self, file: &Path) -> Result<Flow> {
        let text = fs::read_to_string(file).map_err(|e| {
            tracing::error!(file = %file.display(), error = %e, "failed to open config file");
            Error::read_file(file, e)
        })?;

        let opts = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(&text, opts).map_err(|e| {
            tracing::error!(file = %file.display(), error = %e, "parse error in config file");
            Error::Xml {
                path: file.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        self.file = file.to_path_buf();
        self.probe = None;
        self.cursor = Cursor::default();
        self.stack.clear();
        self.stack.push(Frame {
            element: None,
            children: ROOT_CHILDREN,
        });

        self.visited.push(file.to_path_buf());

        match self.walk(&doc, doc.root()) {
            Ok(None) => {}
            Ok(Some(next)) => return Ok(Flow::Redirect(next)),
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "error in config file");
                return Err(e);
            }
        }

        Ok(Flow::Finished)
    }

    /// Feed the elements under `node` to the handlers in document order.
    ///
    /// Stops early with the next file when a codec probe redirects.
    fn walk(&mut self, doc: &Document<'_>, node: Node<'_, '_>) -> Result<Option<PathBuf>> {
        for child in node.children().filter(Node::is_element) {
            let line = doc.text_pos_at(child.range().start).row;
            self.start_element(child).map_err(|e| e.at_line(line))?;
            if let Some(next) = self.walk(doc, child)? {
                return Ok(Some(next));
            }
            if let Some(next) = self.end_element().map_err(|e| e.at_line(line))? {
                return Ok(Some(next));
            }
        }
        Ok(None)
    }

    fn start_element(&mut self, node: Node<'_, '_>) -> Result<()> {
        let tag = node.tag_name().name();
        let depth = self.stack.len().saturating_sub(1);
        let parent = self.stack.last().copied().unwrap_or(Frame {
            element: None,
            children: 0,
        });

        let Some(element) = match_element(tag, parent.children).filter(|_| depth < MAX_PARSE_DEPTH)
        else {
            tracing::error!(element = tag, "element not allowed here");
            return Err(Error::syntax(format!("Element '{tag}' not allowed here")));
        };

        let attrs = extract_attrs(element, node.attributes().map(|a| (a.name(), a.value())))?;
        tracing::trace!(element = tag, "start");

        match element {
            Element::Ctl => self.ctl_start(&attrs, parent.element)?,
            Element::Path => self.path_start(&attrs)?,
            Element::Device => self.device_start(&attrs)?,
            Element::Stream => self.stream_start(&attrs)?,
            Element::Enable => self.route_path_start(&attrs, true)?,
            Element::Disable => self.route_path_start(&attrs, false)?,
            Element::Case => self.case_start(&attrs)?,
            Element::UseCase => self.usecase_start(&attrs)?,
            Element::Set => self.set_start(&attrs)?,
            Element::StreamCtl => self.stream_ctl_start(&attrs)?,
            Element::Init => {
                if let Some(mixer) = self.stack.last_mut() {
                    mixer.children &= !INIT_EXCLUDES;
                }
            }
            Element::PreInit | Element::AudioHal => {}
            Element::Mixer => self.mixer_start(&attrs)?,
            Element::CodecProbe => self.codec_probe_start(&attrs)?,
            Element::CodecCase => self.codec_case_start(&attrs)?,
        }

        self.stack.push(Frame {
            element: Some(element),
            children: element.spec().children,
        });
        Ok(())
    }

    /// Returns the next file when a codec probe redirects.
    fn end_element(&mut self) -> Result<Option<PathBuf>> {
        let Some(frame) = self.stack.pop() else {
            return Ok(None);
        };
        let Some(element) = frame.element else {
            return Ok(None);
        };
        tracing::trace!(element = element.tag(), "end");

        match element {
            Element::Mixer => {
                if let Some(root) = self.stack.last_mut() {
                    root.children = AFTER_MIXER_CHILDREN;
                }
            }
            Element::PreInit => self.preinit_end()?,
            Element::CodecProbe => return self.codec_probe_end(),
            Element::Device => self.cursor.device = None,
            Element::Path => self.cursor.path = None,
            Element::Stream => self.cursor.stream = None,
            Element::UseCase => self.cursor.usecase = None,
            Element::Case => self.cursor.case = None,
            _ => {}
        }
        Ok(None)
    }

    fn mixer_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let card = match (attrs.get(Attr::Card), attrs.get(Attr::Name)) {
            (Some(_), Some(_)) => {
                return Err(Error::syntax(
                    "Mixer must be configured by only one of 'card' or 'name'",
                ));
            }
            (Some(_), None) => uint_attr(attrs, Attr::Card)?.unwrap_or_default(),
            (None, Some(name)) => self
                .opener
                .card_by_name(name)
                .ok_or_else(|| Error::syntax(format!("No sound card named '{name}'")))?,
            (None, None) => return Err(Error::syntax("Mixer needs 'card' or 'name'")),
        };

        if self.mixer.take().is_some() {
            tracing::debug!(card, "replacing mixer opened by an earlier file");
            self.invalidate_bindings();
        }

        tracing::debug!(card, "opening mixer");
        self.mixer = Some(self.opener.open(card)?);
        self.card = card;
        Ok(())
    }

    fn preinit_end(&mut self) -> Result<()> {
        tracing::debug!(count = self.preinit.len(), "applying pre_init");
        let mixer = open_mixer(&mut self.mixer)?;
        apply_ctls(mixer, &mut self.preinit);
        self.preinit.free();

        // Reopen so controls created by pre_init become visible.
        self.mixer = None;
        self.mixer = Some(self.opener.open(self.card).map_err(|e| {
            tracing::error!(card = self.card, error = %e, "failed to reopen mixer");
            e
        })?);
        self.invalidate_bindings();
        Ok(())
    }

    fn invalidate_bindings(&mut self) {
        self.model.invalidate_bindings();
        self.init.iter_mut().for_each(Ctl::invalidate);
    }

    fn device_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let name = attrs.required(Attr::Name)?;
        let mask = devices::device_by_name(name)
            .ok_or_else(|| Error::syntax(format!("'{name}' is not a valid device")))?;

        if mask == devices::NONE {
            if self.model.global_device().is_some() {
                return Err(Error::syntax(format!("Device '{name}' already defined")));
            }
        } else {
            let existing = if devices::is_input(mask) {
                &mut self.model.supported_input_devices
            } else {
                &mut self.model.supported_output_devices
            };
            if *existing & mask == mask {
                return Err(Error::syntax(format!("Device '{name}' already defined")));
            }
            *existing |= mask;
        }

        tracing::debug!(device = name, mask = format_args!("{mask:#x}"), "added device");
        self.model.devices.push(Device::new(mask))?;
        self.cursor.device = Some(self.model.devices.len() - 1);
        Ok(())
    }

    fn path_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let name = attrs.required(Attr::Name)?;
        let id = self.path_name_id(name)?;

        let device = self
            .cursor
            .device
            .and_then(|i| self.model.devices.get_mut(i))
            .ok_or_else(|| Error::syntax("'path' outside a device"))?;
        if device.path_position(id).is_some() {
            return Err(Error::syntax(format!(
                "Path '{name}' already defined for this device"
            )));
        }
        device.paths.push(audioroute_core::Path::new(id))?;
        self.cursor.path = Some(device.paths.len() - 1);

        tracing::trace!(path = name, id, "added path");
        Ok(())
    }

    /// Id of a path name, registering it on first use.
    fn path_name_id(&mut self, name: &str) -> Result<PathId> {
        if let Some(id) = self.model.path_id(name) {
            return Ok(id);
        }
        self.model.path_names.push(name.to_owned())?;
        Ok((self.model.path_names.len() - 1) as PathId)
    }

    fn ctl_start(&mut self, attrs: &Attrs<'_>, parent: Option<Element>) -> Result<()> {
        let name = attrs.required(Attr::Name)?;
        let index = match uint_attr(attrs, Attr::Index)? {
            Some(i) => CtlIndex::At(i),
            None => CtlIndex::All,
        };
        let value = match (attrs.get(Attr::File), attrs.get(Attr::Val)) {
            (Some(file), _) => CtlValue::PendingFile(paths::resolve_relative(&self.file, file)),
            (None, Some(val)) => CtlValue::Pending(val.to_owned()),
            (None, None) => {
                return Err(Error::syntax(format!(
                    "Control '{name}' needs 'val' or 'file'"
                )));
            }
        };

        let mut ctl = Ctl::new(name, index, value);
        if let Some(mixer) = self.mixer.as_deref_mut() {
            match bind(mixer, &mut ctl) {
                Ok(()) => {}
                Err(Error::ControlNotFound(_)) => {
                    tracing::debug!(control = name, "control not present yet, binding later");
                }
                Err(e) => return Err(e),
            }
        }

        let list = self
            .ctl_list(parent)
            .ok_or_else(|| Error::syntax("'ctl' outside a control list"))?;
        list.push(ctl)?;
        Ok(())
    }

    fn ctl_list(&mut self, parent: Option<Element>) -> Option<&mut DynArray<Ctl>> {
        match parent? {
            Element::Path => {
                let (d, p) = (self.cursor.device?, self.cursor.path?);
                Some(&mut self.model.devices.get_mut(d)?.paths.get_mut(p)?.ctls)
            }
            Element::Case => {
                let (u, c) = (self.cursor.usecase?, self.cursor.case?);
                let stream = self.model.stream_mut(self.cursor.stream?)?;
                Some(&mut stream.usecases.get_mut(u)?.cases.get_mut(c)?.ctls)
            }
            Element::Init => Some(&mut self.init),
            Element::PreInit => Some(&mut self.preinit),
            _ => None,
        }
    }

    fn current_stream(&mut self) -> Result<&mut Stream> {
        self.cursor
            .stream
            .and_then(|id| self.model.stream_mut(id))
            .ok_or_else(|| Error::syntax("element outside a stream"))
    }

    fn stream_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let name = attrs.get(Attr::Name);
        if let Some(name) = name
            && self.model.find_named_stream(name).is_some()
        {
            return Err(Error::syntax(format!("Stream '{name}' already declared")));
        }
        let global = name == Some("global");

        let out = match attrs.get(Attr::Dir) {
            None if global => true,
            None => return Err(Error::syntax("'dir' is required")),
            Some("out") => true,
            Some("in") => false,
            Some(other) => {
                return Err(Error::syntax(format!("'{other}' is not a valid direction")));
            }
        };

        let stream_type = if global {
            StreamType::Global
        } else {
            match attrs.required(Attr::Type)? {
                "hw" if name.is_none() => {
                    return Err(Error::syntax("Anonymous stream cannot be type hw"));
                }
                "hw" if out => StreamType::OutHw,
                "hw" => StreamType::InHw,
                "pcm" => StreamType::for_request(!out, true),
                "compress" => StreamType::for_request(!out, false),
                other => {
                    return Err(Error::syntax(format!("'{other}' not a valid stream type")));
                }
            }
        };

        let mut info = HwStream::new(stream_type, self.card);
        if let Some(card) = uint_attr(attrs, Attr::Card)? {
            info.card_number = card;
        }
        if let Some(device) = uint_attr(attrs, Attr::Device)? {
            info.device_number = device;
        }
        info.rate = uint_attr(attrs, Attr::Rate)?.unwrap_or(0);
        info.period_size = uint_attr(attrs, Attr::PeriodSize)?.unwrap_or(0);
        info.period_count = uint_attr(attrs, Attr::PeriodCount)?.unwrap_or(0);
        let max_ref_count = uint_attr(attrs, Attr::Instances)?.unwrap_or(UNLIMITED_INSTANCES);

        tracing::debug!(
            name = name.unwrap_or(""),
            stream_type = %stream_type,
            card = info.card_number,
            device = info.device_number,
            max_ref_count,
            "added stream"
        );

        let stream = Stream::new(name.map(str::to_owned), info, max_ref_count);
        let (pool, streams) = if name.is_some() {
            (StreamPool::Named, &mut self.model.named_streams)
        } else {
            (StreamPool::Anonymous, &mut self.model.anon_streams)
        };
        streams.push(stream)?;
        self.cursor.stream = Some(StreamId {
            pool,
            index: streams.len() - 1,
        });
        Ok(())
    }

    fn route_path_start(&mut self, attrs: &Attrs<'_>, enable: bool) -> Result<()> {
        let path = attrs.required(Attr::Path)?;
        let id = self
            .model
            .path_id(path)
            .ok_or_else(|| Error::syntax(format!("Path '{path}' not defined")))?;

        let stream = self.current_stream()?;
        if enable {
            stream.enable_path = Some(id);
        } else {
            stream.disable_path = Some(id);
        }
        tracing::trace!(path, id, enable, "stream route path");
        Ok(())
    }

    fn stream_ctl_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let name = attrs.required(Attr::Name)?;
        let function = attrs.required(Attr::Function)?;

        let mut vol = VolumeControl {
            name: name.to_owned(),
            binding: audioroute_core::Binding::Unresolved,
            index: uint_attr(attrs, Attr::Index)?.unwrap_or(0),
            min: 0,
            max: 0,
        };

        let mixer = open_mixer(&mut self.mixer)?;
        let id = bind_volume(mixer, &mut vol).map_err(|e| match e {
            Error::ControlNotFound(_) => Error::syntax(format!("Control '{name}' not found")),
            Error::InvalidValue(_) => Error::syntax(format!("Control '{name}' is not an integer")),
            other => other,
        })?;

        let left = match function {
            "leftvol" => true,
            "rightvol" => false,
            other => {
                return Err(Error::syntax(format!(
                    "'{other}' is not a valid control function"
                )));
            }
        };

        let (lo, hi) = mixer.range(id)?;
        vol.min = int_attr(attrs, Attr::Min)?.unwrap_or(lo);
        vol.max = int_attr(attrs, Attr::Max)?.unwrap_or(hi);

        tracing::debug!(control = name, function, min = vol.min, max = vol.max, "added volume control");

        let stream = self.current_stream()?;
        let slot = if left {
            &mut stream.volume_left
        } else {
            &mut stream.volume_right
        };
        if slot.is_some() {
            tracing::error!(control = name, function, "volume control specified again");
        }
        *slot = Some(vol);
        Ok(())
    }

    fn usecase_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let name = attrs.required(Attr::Name)?;
        let stream = self.current_stream()?;
        stream.usecases.push(UseCase {
            name: name.to_owned(),
            cases: DynArray::new(),
        })?;
        let index = stream.usecases.len() - 1;
        self.cursor.usecase = Some(index);
        tracing::trace!(usecase = name, "added usecase");
        Ok(())
    }

    fn case_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let name = attrs.required(Attr::Name)?;
        let usecase = self
            .cursor
            .usecase
            .ok_or_else(|| Error::syntax("'case' outside a usecase"))?;
        let stream = self.current_stream()?;
        let uc = stream
            .usecases
            .get_mut(usecase)
            .ok_or_else(|| Error::syntax("'case' outside a usecase"))?;
        uc.cases.push(Case {
            name: name.to_owned(),
            ctls: DynArray::new(),
        })?;
        let index = uc.cases.len() - 1;
        self.cursor.case = Some(index);
        Ok(())
    }

    fn set_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let name = attrs.required(Attr::Name)?;
        let value = attrs.required(Attr::Val)?;
        self.current_stream()?.constants.push(Constant {
            name: name.to_owned(),
            value: value.to_owned(),
        })?;
        tracing::trace!(constant = name, value, "added constant");
        Ok(())
    }

    fn codec_probe_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        if self.probe.is_some() {
            return Err(Error::syntax("The codec_probe block redefined"));
        }
        let file = attrs.required(Attr::File)?;
        self.probe = Some(CodecProbe {
            file: paths::resolve_relative(&self.file, file),
            cases: DynArray::new(),
        });
        Ok(())
    }

    fn codec_case_start(&mut self, attrs: &Attrs<'_>) -> Result<()> {
        let codec = attrs.required(Attr::Name)?;
        let file = paths::resolve_relative(&self.file, attrs.required(Attr::File)?);
        let probe = self
            .probe
            .as_mut()
            .ok_or_else(|| Error::syntax("'case' outside codec_probe"))?;
        probe.cases.push(CodecCase {
            codec: codec.to_owned(),
            file,
        })?;
        Ok(())
    }

    fn codec_probe_end(&mut self) -> Result<Option<PathBuf>> {
        let Some(probe) = self.probe.as_mut() else {
            return Ok(None);
        };
        probe.cases.compress();

        let Some(codec) = probe::read_codec_name(
            &probe.file,
            self.options.probe_poll_interval(),
            self.options.probe_timeout(),
        )?
        else {
            return Ok(None);
        };

        let Some(case) = probe.cases.iter().find(|c| c.codec == codec) else {
            tracing::warn!(codec, "no config file for probed codec");
            return Ok(None);
        };

        if self.visited.contains(&case.file) {
            return Err(Error::syntax(format!(
                "Codec probe redirect to {} would load it twice",
                case.file.display()
            )));
        }
        Ok(Some(case.file.clone()))
    }

    fn finish(mut self) -> Result<LoadedConfig> {
        let Some(mut mixer) = self.mixer.take() else {
            tracing::error!(file = %self.file.display(), "no <mixer> element");
            return Err(Error::syntax("No <mixer> element"));
        };

        if tracing::enabled!(tracing::Level::TRACE) {
            log_model(&self.model);
        }

        tracing::debug!(count = self.init.len(), "applying init");
        apply_ctls(mixer.as_mut(), &mut self.init);
        self.model.compress();

        tracing::info!(
            devices = self.model.devices.len(),
            streams = self.model.anon_streams.len() + self.model.named_streams.len(),
            card = self.card,
            "configuration loaded"
        );

        Ok(LoadedConfig {
            model: self.model,
            mixer,
            card: self.card,
        })
    }
}

fn open_mixer(mixer: &mut Option<Box<dyn Mixer>>) -> Result<&mut dyn Mixer> {
    match mixer {
        Some(m) => Ok(m.as_mut()),
        None => Err(Error::syntax("No mixer opened")),
    }
}

fn uint_attr(attrs: &Attrs<'_>, attr: Attr) -> Result<Option<u32>> {
    attrs
        .get(attr)
        .map(|s| {
            parse_u32(s).map_err(|_| {
                Error::syntax(format!("'{s}' is not a valid value for '{}'", attr.name()))
            })
        })
        .transpose()
}

fn int_attr(attrs: &Attrs<'_>, attr: Attr) -> Result<Option<i32>> {
    attrs
        .get(attr)
        .map(|s| {
            parse_i32(s).map_err(|_| {
                Error::syntax(format!("'{s}' is not a valid value for '{}'", attr.name()))
            })
        })
        .transpose()
}

fn log_model(model: &Model) {
    tracing::trace!(devices = model.devices.len(), "compiled model");
    for (d, device) in model.devices.iter().enumerate() {
        tracing::trace!(
            device = d,
            mask = format_args!("{:#x}", device.mask),
            paths = device.paths.len(),
            "device"
        );
        for path in &device.paths {
            tracing::trace!(
                path = model.path_name(path.id).unwrap_or("?"),
                ctls = path.ctls.len(),
                "path"
            );
            for ctl in &path.ctls {
                tracing::trace!(
                    control = %ctl.name,
                    index = ?ctl.index,
                    value = ?ctl.value,
                    bound = ctl.binding.is_bound(),
                    "ctl"
                );
            }
        }
    }
}
