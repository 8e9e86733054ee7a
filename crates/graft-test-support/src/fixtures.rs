//! Ready-made source libraries and consumer projects

use crate::SourceTree;

/// Files of a miniature `taskflow` library (path, contents)
pub const TASKFLOW_FILES: &[(&str, &str)] = &[
    ("taskflow/__init__.py", ""),
    (
        "taskflow/exceptions.py",
        "class TaskFlowException(Exception):\n    pass\n",
    ),
    (
        "taskflow/task.py",
        "import abc\n\
         \n\
         from taskflow.utils import misc\n\
         from taskflow.utils import reflection as refl  # helpers\n\
         \n\
         \n\
         class BaseTask(object):\n    __metaclass__ = abc.ABCMeta\n",
    ),
    ("taskflow/decorators.py", "from taskflow import task as base\n"),
    ("taskflow/flow.py", "from taskflow.utils import reflection\n"),
    (
        "taskflow/storage.py",
        "from taskflow import exceptions\nfrom taskflow.persistence import logbook\n",
    ),
    ("taskflow/utils/__init__.py", ""),
    (
        "taskflow/utils/misc.py",
        "import os\n\
         import sys\n\
         \n\
         from taskflow import exceptions as exc\n\
         from taskflow.openstack.common import uuidutils\n\
         \n\
         possible_topdir = os.path.normpath(os.path.join(os.path.abspath(__file__),\n\
         \x20                                               os.pardir,\n\
         \x20                                               os.pardir))\n\
         sys.path.insert(0, os.path.join(possible_topdir, \"taskflow\",\n\
         \x20                               \"examples\"))\n",
    ),
    ("taskflow/utils/reflection.py", "import inspect\n"),
    ("taskflow/openstack/__init__.py", ""),
    ("taskflow/openstack/common/__init__.py", ""),
    ("taskflow/openstack/common/uuidutils.py", "import uuid\n"),
    ("taskflow/openstack/common/jsonutils.py", "import json\n"),
    ("taskflow/patterns/__init__.py", ""),
    ("taskflow/patterns/linear_flow.py", "from taskflow import flow\n"),
    (
        "taskflow/patterns/graph_flow.py",
        "from taskflow import flow\nfrom taskflow.patterns import linear_flow\n",
    ),
    (
        "taskflow/engines/__init__.py",
        "from taskflow.engines.helpers import load  # noqa\n",
    ),
    (
        "taskflow/engines/helpers.py",
        "ENGINES_NAMESPACE = 'taskflow.engines'\n\n\ndef load(flow):\n    return flow\n",
    ),
    ("taskflow/engines/base.py", "import abc\n"),
    ("taskflow/engines/action_engine/__init__.py", ""),
    (
        "taskflow/engines/action_engine/engine.py",
        "from taskflow.engines import base\nfrom taskflow import storage as t_storage\n",
    ),
    ("taskflow/persistence/__init__.py", ""),
    (
        "taskflow/persistence/logbook.py",
        "from taskflow.openstack.common import jsonutils\n",
    ),
    (
        "taskflow/persistence/backends/__init__.py",
        "BACKEND_NAMESPACE = 'taskflow.persistence'\n\nfrom taskflow import exceptions as exc\n",
    ),
    ("taskflow/persistence/backends/base.py", "import abc\n"),
    (
        "taskflow/persistence/backends/impl_memory.py",
        "from taskflow.persistence.backends import base\n",
    ),
    (
        "taskflow/persistence/backends/impl_dir.py",
        "from taskflow.persistence.backends import base\nfrom taskflow.utils import misc\n",
    ),
];

/// Packaging manifest shipped next to the miniature library
pub const TASKFLOW_SETUP_CFG: &str = "\
[metadata]
name = taskflow

[entry_points]
taskflow.persistence =
    memory = taskflow.persistence.backends.impl_memory:MemoryBackend
    dir = taskflow.persistence.backends.impl_dir:DirBackend

taskflow.engines =
    default = taskflow.engines.action_engine.engine:SingleThreadedActionEngine
";

/// A source checkout containing the miniature `taskflow` library and its `setup.cfg`
pub fn taskflow_library() -> SourceTree {
    let tree = SourceTree::new();
    for (path, contents) in TASKFLOW_FILES {
        tree.write(path, contents);
    }
    tree.write("setup.cfg", TASKFLOW_SETUP_CFG);
    tree
}

/// A consumer project whose package is `base` (`<base>/__init__.py` exists)
pub fn consumer_project(base: &str) -> SourceTree {
    SourceTree::new().with_file(&format!("{}/__init__.py", base), "")
}

/// A consumer project that already vendors the given shared modules
///
/// `shared` holds dotted names relative to `base`, e.g. `openstack.common.uuidutils`.
pub fn consumer_with_shared(base: &str, shared: &[&str]) -> SourceTree {
    let tree = consumer_project(base);
    for module in shared {
        let relative = format!("{}/{}.py", base, module.replace('.', "/"));
        tree.write(&relative, "# vendored by the consumer\n");
    }
    tree
}
